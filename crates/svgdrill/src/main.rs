use anyhow::{bail, Result};
use std::process::ExitCode;
use svgdrill::*;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let format = match args.first().map(|s| s.as_str()) {
        Some("csv") => ExportFormat::Csv,
        Some("gcode") => ExportFormat::Gcode,
        _ => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    let Some(input) = args.get(1) else {
        print_usage();
        return ExitCode::FAILURE;
    };

    match run(format, input, &args[2..]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(format: ExportFormat, input: &str, options: &[String]) -> Result<()> {
    let options = split_options(options)?;
    let fallback = ExportConfig::default_config_path().ok();
    let config = ExportConfig::from_options(&options, fallback.as_deref())?;
    if let Err(err) = init_logging(config.debug) {
        eprintln!("warning: {err:#}");
    }

    if config.output.as_os_str().is_empty() {
        bail!("missing --output");
    }

    let document = SvgDocument::load(input)?;
    let written = export(&document, &config, format)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: svgdrill [csv|gcode] <input.svg> --output=FILE [--key=value ...]");
    eprintln!("  csv    - Write drill coordinates as CSV");
    eprintln!("  gcode  - Write a drill program (G81/G83 canned cycles)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --unit=in|mm  --flipy=true  --scope=document|layer|selection");
    eprintln!("  --id=ID (repeatable)  --layer=ID_OR_LABEL  --separatedrills=true");
    eprintln!("  --toolno=N  --incrementtools=true  --rpm=N  --zfeed=F");
    eprintln!("  --zclear=Z  --zstart=Z  --zend=Z  --peck=P");
    eprintln!("  --spottoolno=N  --spotzend=Z");
    eprintln!("  --mark=FILE  --markcolor=#RRGGBB  --markwidth=W");
    eprintln!("  --config=FILE  --debug=true");
}
