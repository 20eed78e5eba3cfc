use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use paytax_core::RawCalculationRequest;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Payroll tax calculator for Singapore, the United States and China.
///
/// Loads the rate tables once, then answers catalog queries or runs
/// calculations. Results go to stdout; logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "paytax", version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the rate CSV files. The bundled tables are used when
    /// neither this flag nor the config file names one.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log filter ("warn", "debug", or any `RUST_LOG` directive).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List supported jurisdictions.
    Jurisdictions,
    /// List tax years with data, newest first.
    Years,
    /// List the regions of a jurisdiction.
    Regions { jurisdiction: String },
    /// List the subregions of a region.
    Subregions { jurisdiction: String, region: String },
    /// Run one calculation.
    Calculate(CalculateArgs),
    /// Run every request in a JSON file.
    Batch {
        /// JSON array of requests using the web form keys.
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// Calculation flags. Values are kept as text and sanitized by the engine, so
/// `--income 1,000` and `--income abc` behave as they would from a web form.
#[derive(Debug, Clone, Default, Args)]
pub struct CalculateArgs {
    #[arg(short, long)]
    pub jurisdiction: String,

    #[arg(short, long)]
    pub income: String,

    /// State or province.
    #[arg(long)]
    pub region: Option<String>,

    /// City.
    #[arg(long)]
    pub subregion: Option<String>,

    /// Tax year. Defaults to the current calendar year.
    #[arg(short, long)]
    pub year: Option<String>,

    #[arg(long)]
    pub non_resident: bool,

    /// Age for Singapore CPF.
    #[arg(long)]
    pub age: Option<String>,

    /// 401(k) contribution, percent of income.
    #[arg(long)]
    pub contribution_percent: Option<String>,

    /// Employer 401(k) match, percent of income.
    #[arg(long)]
    pub employer_match_percent: Option<String>,

    /// Cap on the employer match, percent of income.
    #[arg(long)]
    pub employer_match_limit_percent: Option<String>,
}

impl From<CalculateArgs> for RawCalculationRequest {
    fn from(args: CalculateArgs) -> Self {
        RawCalculationRequest {
            country: Some(args.jurisdiction),
            income: Some(args.income),
            state: args.region,
            city: args.subregion,
            tax_year: args.year,
            is_resident: Some((!args.non_resident).to_string()),
            age: args.age,
            contribution_percent: args.contribution_percent,
            employer_match_percent: args.employer_match_percent,
            employer_match_limit_percent: args.employer_match_limit_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("paytax").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["years", "--format", "table", "--data-dir", "/tmp/rates"]);

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/rates")));
        assert!(matches!(cli.command, Command::Years));
    }

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(parse(&["jurisdictions"]).format, OutputFormat::Json);
    }

    #[test]
    fn subregions_takes_two_positionals() {
        let cli = parse(&["subregions", "United States", "Ohio"]);

        match cli.command {
            Command::Subregions {
                jurisdiction,
                region,
            } => {
                assert_eq!(jurisdiction, "United States");
                assert_eq!(region, "Ohio");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn calculate_requires_jurisdiction_and_income() {
        let result = Cli::try_parse_from(["paytax", "calculate", "--income", "100"]);

        assert!(result.is_err());
    }

    #[test]
    fn calculate_args_become_raw_request() {
        let cli = parse(&[
            "calculate",
            "--jurisdiction",
            "United States",
            "--income",
            "100,000",
            "--region",
            "Ohio",
            "--subregion",
            "Columbus",
            "--year",
            "2024",
            "--non-resident",
            "--contribution-percent",
            "6",
        ]);
        let Command::Calculate(args) = cli.command else {
            panic!("expected calculate");
        };

        let raw = RawCalculationRequest::from(args);

        assert_eq!(
            raw,
            RawCalculationRequest {
                country: Some("United States".to_string()),
                income: Some("100,000".to_string()),
                state: Some("Ohio".to_string()),
                city: Some("Columbus".to_string()),
                tax_year: Some("2024".to_string()),
                is_resident: Some("false".to_string()),
                age: None,
                contribution_percent: Some("6".to_string()),
                employer_match_percent: None,
                employer_match_limit_percent: None,
            }
        );
    }
}
