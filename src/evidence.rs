use crate::overlay::RecognizedLine;

/// A sentence the extraction service cited as support for a code.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    pub source_sentence: String,
    pub code: Option<String>,
}

impl EvidenceRecord {
    pub fn new(source_sentence: impl Into<String>) -> Self {
        Self {
            source_sentence: source_sentence.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Resolves each record to the first line whose text is byte-for-byte equal to
/// its sentence. Records without a match are dropped. Output follows record
/// order.
pub fn match_evidence(records: &[EvidenceRecord], lines: &[RecognizedLine]) -> Vec<RecognizedLine> {
    records
        .iter()
        .filter_map(|record| find_line(record, lines))
        .cloned()
        .collect()
}

fn find_line<'a>(
    record: &EvidenceRecord,
    lines: &'a [RecognizedLine],
) -> Option<&'a RecognizedLine> {
    lines.iter().find(|line| line.text == record.source_sentence)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEvidence {
    pub record: EvidenceRecord,
    pub line: RecognizedLine,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceReport {
    pub matched: Vec<MatchedEvidence>,
    pub unmatched: Vec<EvidenceRecord>,
}

impl EvidenceReport {
    /// Lines for the highlighted layer, same sequence as [`match_evidence`].
    pub fn highlighted(&self) -> Vec<RecognizedLine> {
        self.matched.iter().map(|m| m.line.clone()).collect()
    }
}

/// Same resolution as [`match_evidence`], keeping track of which record each
/// line came from and which records found nothing.
pub fn match_report(records: &[EvidenceRecord], lines: &[RecognizedLine]) -> EvidenceReport {
    let mut report = EvidenceReport::default();
    for record in records {
        match find_line(record, lines) {
            Some(line) => report.matched.push(MatchedEvidence {
                record: record.clone(),
                line: line.clone(),
            }),
            None => report.unmatched.push(record.clone()),
        }
    }
    report
}
