use std::path::Path;

use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `path` into the process environment. Returns `Ok(false)` when the
/// file does not exist; any other failure, including a line that does not
/// parse, is an error.
pub fn load_env_file(path: &Path) -> anyhow::Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => {
            Err(anyhow::Error::new(e).context(format!("Failed to load {}", path.display())))
        }
    }
}

pub fn format_number(num: usize) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn delimiter_byte(delimiter: char) -> anyhow::Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("--delimiter must be a single ASCII character, got {:?}", delimiter);
    }
    Ok(delimiter as u8)
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if args.rows == 0 {
        anyhow::bail!("--rows must be greater than 0");
    }

    if args.samples == 0 {
        anyhow::bail!("--samples must be greater than 0");
    }

    if args.top == 0 {
        anyhow::bail!("--top must be greater than 0");
    }

    for prefix in &args.prefixes {
        if prefix.chars().count() != crate::compare::PREFIX_LEN {
            anyhow::bail!(
                "--prefix must be exactly {} characters, got {:?}",
                crate::compare::PREFIX_LEN,
                prefix
            );
        }
    }

    delimiter_byte(args.delimiter)?;

    Ok(())
}
