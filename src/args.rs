use clap::Parser;

/// This is a party-list seat allocation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election configuration in JSON format.
    /// For more information about the file format, read the manual of the party_list crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of an election in JSON format. If provided, plvote will
    /// check that the computed summary matches the reference. Use it with a fixed seed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file paths) The ballot files, in the order in which they are read. The first file defines the
    /// parties and candidates. Setting this option overrides the files listed in the --config option.
    #[clap(short, long, value_parser)]
    pub input: Vec<String>,

    /// (integer, optional) Seed for the tiebreak lottery. Two runs with the same seed and the same
    /// ballots produce the same outcome. Overrides the rules of the --config option.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
