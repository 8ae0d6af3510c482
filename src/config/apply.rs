//! Startup `set` sequence derived from [`PlotSettings`].

use crate::{channel::CommandChannel, error::Result};

use super::PlotSettings;

pub fn separator_command(separator: &str) -> String {
    format!("datafile separator \"{}\"", separator)
}

pub fn term_command(terminal: &str, (width, height): (u32, u32)) -> String {
    format!("term {} size {},{}", terminal, width, height)
}

pub fn time_format_command(fmt: &str) -> String {
    format!("timefmt \"{}\"", fmt)
}

/// Arguments for the five startup `set` commands, in the order they are sent:
/// separator, terminal, sampling, time format, key.
pub fn startup_commands(settings: &PlotSettings) -> Vec<String> {
    vec![
        separator_command(&settings.separator),
        term_command(&settings.terminal, settings.canvas),
        // Both sampling options travel on one line to keep a single command
        format!("samples {}; set isosamples {}", settings.samples, settings.isosamples),
        time_format_command(&settings.time_format),
        format!("key {}", settings.key),
    ]
}

pub async fn apply(channel: &mut CommandChannel, settings: &PlotSettings) -> Result<()> {
    for arg in startup_commands(settings) {
        channel.set(&arg).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_five_commands_in_order() {
        let cmds = startup_commands(&PlotSettings::default());
        assert_eq!(
            cmds,
            vec![
                "datafile separator \" \"",
                "term wxt size 800,480",
                "samples 128; set isosamples 128",
                "timefmt \"%Y-%m-%dT%H:%M:%S\"",
                "key top left",
            ]
        );
    }

    #[test]
    fn png_terminal_with_custom_canvas() {
        let settings = PlotSettings {
            terminal: "png".into(),
            canvas: (640, 480),
            ..Default::default()
        };
        let cmds = startup_commands(&settings);
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[1], "term png size 640,480");
    }
}
