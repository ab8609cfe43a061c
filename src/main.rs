use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-evidence-viewer",
    version,
    about = "Overlay OCR line boxes and code evidence on a scanned page"
)]
struct Cli {
    /// Page image to upload to the document service
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Document service base URL (overrides settings and OCR_EVIDENCE_API_BASE)
    #[arg(long = "api-base")]
    api_base: Option<String>,

    /// Run code extraction and highlight the supporting lines
    #[arg(short = 'e', long = "extract")]
    extract: bool,

    /// Restrict the evidence report to these codes (repeatable)
    #[arg(long = "icd-code")]
    icd_codes: Vec<String>,

    /// Write the rendered overlay to this image path (png, jpg, webp, ...)
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Displayed page width in pixels (height follows the image aspect ratio)
    #[arg(long = "display-width")]
    display_width: Option<u32>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ocr_evidence_viewer::logging::init(cli.verbose)?;

    let output = ocr_evidence_viewer::run(ocr_evidence_viewer::Config {
        file: cli.file,
        api_base: cli.api_base,
        extract: cli.extract,
        icd_codes: cli.icd_codes,
        output: cli.output,
        display_width: cli.display_width,
        settings_path: cli.read_settings,
    })
    .await?;

    println!("{}", output);
    Ok(())
}
