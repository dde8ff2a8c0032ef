use bulkrename_core::ItemKind;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Files below the working directory, renamed leaf name only
    Asset,
    /// Directories; everything below them moves along
    Folder,
    /// In-memory labels that never touch the disk
    Object,
}

impl From<KindArg> for ItemKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Asset => Self::Asset,
            KindArg::Folder => Self::Folder,
            KindArg::Object => Self::Object,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for bulkrename_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Parse a manual name given as `INDEX=NAME`.
pub fn parse_manual_name(s: &str) -> Result<(usize, String), String> {
    let (index, name) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=NAME, got '{s}'"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid index '{}' in '{s}'", index.trim()))?;
    Ok((index, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_name() {
        assert_eq!(parse_manual_name("0=Rock").unwrap(), (0, "Rock".to_string()));
        assert_eq!(
            parse_manual_name("2=a=b").unwrap(),
            (2, "a=b".to_string())
        );
        assert_eq!(parse_manual_name("1=").unwrap(), (1, String::new()));
        assert!(parse_manual_name("Rock").is_err());
        assert!(parse_manual_name("x=Rock").is_err());
    }
}
