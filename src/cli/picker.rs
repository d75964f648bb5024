//! Interactive numbered picker for selection dimensions.
//!
//! Kept separate from clap parsing: clap handles flags/subcommands, the picker
//! fills in whatever dimension was left out (`ht tech` -> choose category,
//! company, metric).

use std::io::{self, BufRead, Write};

use crate::error::AppError;

/// Prompt on stdin/stdout for one of `options`.
pub fn prompt_choice(label: &str, options: &[String]) -> Result<String, AppError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    choose_from(&mut stdin.lock(), &mut stdout.lock(), label, options)
}

/// Picker loop over arbitrary reader/writer.
///
/// Behavior:
/// - list options as `  1) name`
/// - accept either a number or a name (case-insensitive)
/// - `q` cancels, EOF is an error
pub fn choose_from<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    options: &[String],
) -> Result<String, AppError> {
    if options.is_empty() {
        return Err(AppError::new(2, format!("No {label} options available.")));
    }

    let io_err = |e: io::Error| AppError::new(2, format!("Failed to write prompt: {e}"));

    writeln!(output, "Choose a {label}:").map_err(io_err)?;
    for (idx, option) in options.iter().enumerate() {
        writeln!(output, "{:>3}) {option}", idx + 1).map_err(io_err)?;
    }

    loop {
        write!(output, "Select {label} (1-{}, q to quit): ", options.len()).map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(2, format!("No input received for {label}.")));
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = answer.parse::<usize>() {
            if (1..=options.len()).contains(&choice) {
                return Ok(options[choice - 1].clone());
            }
            writeln!(output, "Invalid choice: {choice}. Enter a number between 1 and {}.", options.len())
                .map_err(io_err)?;
            continue;
        }

        if let Some(found) = options.iter().find(|o| o.eq_ignore_ascii_case(answer)) {
            return Ok(found.clone());
        }
        writeln!(output, "Unknown {label}: '{answer}'.").map_err(io_err)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn options() -> Vec<String> {
        ["computers", "smartphones", "software"].map(String::from).to_vec()
    }

    fn run(input: &str) -> (Result<String, AppError>, String) {
        let mut out = Vec::new();
        let result = choose_from(&mut Cursor::new(input), &mut out, "category", &options());
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn picks_by_number_or_name() {
        assert_eq!(run("2\n").0.unwrap(), "smartphones");
        assert_eq!(run("Software\n").0.unwrap(), "software");
    }

    #[test]
    fn retries_after_bad_input() {
        let (result, shown) = run("9\nphones\n1\n");
        assert_eq!(result.unwrap(), "computers");
        assert!(shown.contains("  1) computers"));
        assert!(shown.contains("Invalid choice: 9"));
        assert!(shown.contains("Unknown category: 'phones'"));
    }

    #[test]
    fn quit_and_eof_are_usage_errors() {
        assert_eq!(run("q\n").0.unwrap_err().exit_code(), 2);
        assert_eq!(run("").0.unwrap_err().exit_code(), 2);
    }
}
