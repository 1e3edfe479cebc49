use batchren_core::Config;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl OutputFormat {
    /// Use the flag when given, otherwise the `output` default from config
    pub fn resolve(flag: Option<Self>, config: &Config) -> Self {
        flag.unwrap_or_else(|| {
            batchren_core::OutputFormat::from_config(&config.defaults.output).into()
        })
    }
}

impl From<batchren_core::OutputFormat> for OutputFormat {
    fn from(format: batchren_core::OutputFormat) -> Self {
        match format {
            batchren_core::OutputFormat::Summary => Self::Summary,
            batchren_core::OutputFormat::Json => Self::Json,
        }
    }
}

impl From<OutputFormat> for batchren_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}
