use clap::Parser;

/// This is a program that computes continuing-education credits from evaluation surveys and signature sheets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the description of the run, in JSON format.
    /// For more information about the file format, read the documentation of the `ce_credits::manual` module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference credits table in CSV format. If provided, cecredits will
    /// check that the computed credits match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the credits table will be written in CSV format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the status matrix will be written in CSV format to the given location.
    #[clap(long, value_parser)]
    pub matrix_out: Option<String>,

    /// (file path or empty) The file containing the survey responses. Setting this option overrides
    /// the survey sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the survey input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path) The session registry, in JSON format. Required without --config.
    #[clap(long, value_parser)]
    pub sessions: Option<String>,

    /// (file path) The participant registry, in JSON format. Required without --config.
    #[clap(long, value_parser)]
    pub participants: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
