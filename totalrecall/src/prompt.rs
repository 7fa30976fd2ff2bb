//! Interactive questions asked on the terminal.

use std::io::{self, BufRead, Write};

/// Print `question` and read one trimmed line of input.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    writeln!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for the Windows username whose store should be extracted.
pub fn read_username<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<String> {
    ask(input, output, "Input username:")
}

/// Ask whether to go ahead with the extraction. Only "yes" (any case) confirms.
pub fn confirm_extraction<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    let answer = ask(
        input,
        output,
        "Windows Recall feature found. Do you want to proceed with the extraction? (yes/no): ",
    )?;
    Ok(answer.eq_ignore_ascii_case("yes"))
}
