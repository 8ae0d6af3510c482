//! Staging tabular data where the engine can read it: a data file on disk,
//! or an inline `$name << EOD` block in the command stream.

use std::path::Path;

use tracing::debug;

use crate::{
    channel::CommandChannel,
    error::{Error, Result},
    session::temp_files::TempFiles,
};

use super::Matrix;

pub const SEPARATOR_QUERY: &str = "show datafile separator";
pub const DEFAULT_TERMINATOR: &str = "EOD";

/// Interpret the engine's answer to `show datafile separator`.
///
/// `whitespace` maps to a single space; otherwise the first quoted literal is
/// the separator. Anything else is an error rather than a guess.
pub fn parse_separator(reply: &str) -> Result<String> {
    if reply.contains("whitespace") {
        return Ok(" ".to_string());
    }
    quoted_literal(reply, '"')
        .or_else(|| quoted_literal(reply, '\''))
        .map(str::to_string)
        .ok_or_else(|| Error::ProtocolParse {
            reply: reply.to_string(),
        })
}

fn quoted_literal(reply: &str, quote: char) -> Option<&str> {
    let start = reply.find(quote)? + quote.len_utf8();
    let len = reply[start..].find(quote)?;
    let literal = &reply[start..start + len];
    (!literal.is_empty()).then_some(literal)
}

pub async fn resolve_separator(channel: &mut CommandChannel) -> Result<String> {
    let reply = channel.query(SEPARATOR_QUERY).await?;
    let sep = parse_separator(&reply)?;
    debug!(separator = ?sep, "resolved datafile separator");
    Ok(sep)
}

/// Write `matrix` to `path`, one row per line, fields joined by the separator
/// the engine currently uses. The file is registered in `files` for cleanup;
/// the engine is not told about it.
pub async fn write_file(
    channel: &mut CommandChannel,
    files: &mut TempFiles,
    path: &Path,
    matrix: &Matrix,
) -> Result<()> {
    // Nothing touches the disk until shape and separator are known
    let (cols, rows) = matrix.shape()?;
    let sep = resolve_separator(channel).await?;

    let file = files.create(path)?;
    for line in matrix.rows(&sep) {
        file.write_line(&line)?;
    }
    file.close()?;

    debug!(path = %path.display(), cols, rows, "staged data file");
    Ok(())
}

/// The inline block text, without the final newline `send` adds.
pub fn inline_block<S: AsRef<str>>(name: &str, rows: &[S], terminator: &str) -> String {
    let mut block = format!("${} << {}\n", name, terminator);
    for row in rows {
        block.push_str(row.as_ref());
        block.push('\n');
    }
    block.push_str(terminator);
    block
}

/// Send `rows` as an inline data block and return the `$name` to plot from.
pub async fn write_inline<S: AsRef<str>>(
    channel: &mut CommandChannel,
    name: &str,
    rows: &[S],
    terminator: &str,
) -> Result<String> {
    channel.send(&inline_block(name, rows, terminator)).await?;
    Ok(format!("${}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_reply_means_space() {
        let reply = "\n\tdatafile fields separated by whitespace\n\n";
        assert_eq!(parse_separator(reply).unwrap(), " ");
    }

    #[test]
    fn quoted_reply_yields_literal() {
        let reply = "\tdatafile fields separated by \"|\"\n";
        assert_eq!(parse_separator(reply).unwrap(), "|");
        assert_eq!(parse_separator("separated by \" \"").unwrap(), " ");
        assert_eq!(parse_separator("separated by ','").unwrap(), ",");
        assert_eq!(parse_separator("by \"::\"").unwrap(), "::");
    }

    #[test]
    fn other_replies_are_rejected() {
        for reply in ["", "\n", "datafile fields separated by tab", "by \"\"", "by \"|"] {
            assert!(
                matches!(parse_separator(reply), Err(Error::ProtocolParse { .. })),
                "reply {:?} should not parse",
                reply
            );
        }
    }

    #[test]
    fn inline_block_layout() {
        let block = inline_block("d1", &["1 2", "3 4"], "EOD");
        assert_eq!(block, "$d1 << EOD\n1 2\n3 4\nEOD");
        assert_eq!(inline_block::<&str>("e", &[], "END"), "$e << END\nEND");
    }
}
