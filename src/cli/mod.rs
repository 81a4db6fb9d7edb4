//! Command-line parsing for the polarization-curve fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code: every subcommand converts its arguments into the plain option
//! structs of [`crate::domain`].

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    ActiveFitOptions, LinearFitOptions, MixedFitOptions, SweepConfig, WeightSettings,
};
use crate::io::CurveColumns;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "polfit", version, about = "Polarization curve fitting (Tafel, activation and mixed control)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a Tafel line to one branch of the curve.
    Linear(LinearArgs),
    /// Fit the activation-control model around E_corr.
    Active(ActiveArgs),
    /// Fit the mixed activation-diffusion model, optionally weighted near E_corr.
    Mixed(MixedArgs),
    /// Sweep the mixed fit over weight settings and cathodic windows.
    Sweep(SweepArgs),
    /// Generate a synthetic mixed-control curve and fit it (or write it to CSV).
    Demo(DemoArgs),
    /// Print a fit previously exported with --export-json.
    Show(ShowArgs),
}

/// Where the curve comes from and how to normalize it.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// CSV file with potential and current columns.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Header of the potential column [V vs ref].
    #[arg(long, default_value = "E")]
    pub e_column: String,

    /// Header of the current column.
    #[arg(long, default_value = "I")]
    pub i_column: String,

    /// Resistance for the ohmic-drop correction [Ohm].
    #[arg(short = 'R', long, default_value_t = 0.0)]
    pub resistance: f64,

    /// Exposed surface area; currents are divided by it.
    #[arg(long, default_value_t = 1.0)]
    pub surface: f64,
}

impl InputArgs {
    pub fn columns(&self) -> CurveColumns {
        CurveColumns {
            potential: self.e_column.clone(),
            current: self.i_column.clone(),
        }
    }
}

/// Terminal output and optional files of a single fit.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write the text report of the fit.
    #[arg(long, value_name = "TXT")]
    pub report: Option<PathBuf>,

    /// Write the SVG diagnostic figures into this directory.
    #[arg(long, value_name = "DIR")]
    pub plots: Option<PathBuf>,

    /// Export the fit result to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct LinearArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fit window, absolute potentials [V vs ref].
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true, required = true)]
    pub window: Vec<f64>,

    /// Corrosion potential at which the fitted line is evaluated [V vs ref].
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub e_corr: f64,

    /// Reversible potential for the exchange current density [V vs ref].
    #[arg(long, allow_negative_numbers = true)]
    pub e_rev: Option<f64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl LinearArgs {
    pub fn options(&self) -> LinearFitOptions {
        LinearFitOptions {
            e_corr: self.e_corr,
            e_rev: self.e_rev,
            ..LinearFitOptions::new(window_pair(&self.window))
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ActiveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fit window relative to E_corr [V].
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true, default_values_t = [-1.0, 1.0])]
    pub window: Vec<f64>,

    /// Initial guess of the corrosion current density (default: signed mean of i).
    #[arg(long)]
    pub i_corr_guess: Option<f64>,

    /// Reversible potentials of the anodic and cathodic reactions [V vs ref].
    #[arg(long, num_args = 2, value_names = ["ANODIC", "CATHODIC"], allow_negative_numbers = true)]
    pub e_rev: Option<Vec<f64>>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl ActiveArgs {
    pub fn options(&self) -> ActiveFitOptions {
        ActiveFitOptions {
            i_corr_guess: self.i_corr_guess,
            e_rev: self.e_rev.as_deref().and_then(reversible_pair),
            ..ActiveFitOptions::new(window_pair(&self.window))
        }
    }
}

/// Settings of the mixed fit shared by `mixed` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct MixedSettings {
    /// Fit window relative to E_corr [V].
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true, default_values_t = [-1.0, 1.0])]
    pub window: Vec<f64>,

    /// Initial guess of the corrosion current density (default: signed mean of i).
    #[arg(long)]
    pub i_corr_guess: Option<f64>,

    /// Initial guess of the limiting current density (default: signed mean of i).
    #[arg(long)]
    pub i_l_guess: Option<f64>,

    /// Keep the limiting current at its guess.
    #[arg(long)]
    pub fix_i_l: bool,

    /// Apply the near-E_corr weight distribution.
    #[arg(long)]
    pub weighted: bool,

    /// Half-width of the activation-control window around E_corr [V].
    #[arg(long, default_value_t = MixedFitOptions::DEFAULT_W_AC)]
    pub w_ac: f64,

    /// Share of the total weight given to the activation-control window [%].
    #[arg(short = 'W', long = "weight", default_value_t = MixedFitOptions::DEFAULT_W)]
    pub w_percent: f64,

    /// Reversible potentials of the anodic and cathodic reactions [V vs ref].
    #[arg(long, num_args = 2, value_names = ["ANODIC", "CATHODIC"], allow_negative_numbers = true)]
    pub e_rev: Option<Vec<f64>>,
}

impl MixedSettings {
    pub fn options(&self) -> MixedFitOptions {
        MixedFitOptions {
            i_corr_guess: self.i_corr_guess,
            i_l_guess: self.i_l_guess,
            fix_i_l: self.fix_i_l,
            weighting: self.weighted.then_some(WeightSettings {
                w_ac: self.w_ac,
                w_percent: self.w_percent,
            }),
            e_rev: self.e_rev.as_deref().and_then(reversible_pair),
            ..MixedFitOptions::new(window_pair(&self.window))
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct MixedArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub settings: MixedSettings,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fit window relative to E_corr [V]; the upper end is kept for every fit.
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true, required = true)]
    pub window: Vec<f64>,

    /// Start of the diffusion-controlled domain relative to E_corr [V] (< 0).
    #[arg(long, allow_negative_numbers = true)]
    pub w_dc: f64,

    /// Step of the cathodic window sweep [V].
    #[arg(long, default_value_t = 0.01)]
    pub dw_c: f64,

    /// Step of the activation-control window sweep [V].
    #[arg(long, default_value_t = 0.01)]
    pub dw_ac: f64,

    /// Weight percentages to sweep; 0 means unweighted (default: 50..95 step 5, then 0).
    #[arg(short = 'W', long = "weights", value_delimiter = ',')]
    pub w_percent: Option<Vec<f64>>,

    /// Explicit activation-control windows [V] (default: generated from w_dc and dw_ac).
    #[arg(long, value_delimiter = ',')]
    pub w_ac: Option<Vec<f64>>,

    /// Explicit cathodic windows [V vs E_corr] (default: generated from w_dc and dw_c).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub window_cathodic: Option<Vec<f64>>,

    #[arg(long)]
    pub i_corr_guess: Option<f64>,

    #[arg(long)]
    pub i_l_guess: Option<f64>,

    #[arg(long)]
    pub fix_i_l: bool,

    /// Directory for the sweep tables and figures.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Also draw b_c and i_L against the cathodic window for every W and w_ac.
    #[arg(long)]
    pub effects: bool,
}

impl SweepArgs {
    pub fn config(&self) -> SweepConfig {
        SweepConfig {
            dw_c: self.dw_c,
            dw_ac: self.dw_ac,
            w_percent: self
                .w_percent
                .clone()
                .unwrap_or_else(SweepConfig::default_w_percent),
            w_ac: self.w_ac.clone(),
            window_cathodic: self.window_cathodic.clone(),
            i_corr_guess: self.i_corr_guess,
            i_l_guess: self.i_l_guess,
            fix_i_l: self.fix_i_l,
            ..SweepConfig::new(window_pair(&self.window), self.w_dc)
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Relative standard deviation of multiplicative noise on the current.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Write the synthetic curve to CSV instead of fitting it.
    #[arg(long, value_name = "CSV")]
    pub write_csv: Option<PathBuf>,

    #[command(flatten)]
    pub settings: MixedSettings,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Fit JSON written by --export-json.
    #[arg(short = 'i', long, value_name = "JSON")]
    pub input: PathBuf,

    /// Also print the full report, fitted curve included.
    #[arg(long)]
    pub curve: bool,

    /// Rewrite the stored fit as a text report.
    #[arg(long, value_name = "TXT")]
    pub report: Option<PathBuf>,
}

fn reversible_pair(values: &[f64]) -> Option<(f64, f64)> {
    match values {
        [anodic, cathodic, ..] => Some((*anodic, *cathodic)),
        _ => None,
    }
}

/// `num_args = 2` guarantees two values once parsed.
fn window_pair(values: &[f64]) -> [f64; 2] {
    match values {
        [low, high, ..] => [*low, *high],
        _ => [f64::NAN, f64::NAN],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_arguments_become_options() {
        let cli = Cli::parse_from([
            "polfit", "mixed", "-i", "curve.csv", "--window", "-0.5", "0.15", "--weighted", "-W", "80",
        ]);
        let Command::Mixed(args) = cli.command else {
            panic!("expected mixed");
        };
        let opts = args.settings.options();
        assert_eq!(opts.window, [-0.5, 0.15]);
        assert_eq!(
            opts.weighting,
            Some(WeightSettings {
                w_ac: 0.04,
                w_percent: 80.0
            })
        );
        assert_eq!(args.input.columns().potential, "E");
    }

    #[test]
    fn show_reads_a_json_path() {
        let cli = Cli::parse_from(["polfit", "show", "-i", "fit.json", "--report", "fit.txt"]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.input, PathBuf::from("fit.json"));
        assert_eq!(args.report, Some(PathBuf::from("fit.txt")));
        assert!(!args.curve);
    }

    #[test]
    fn guess_help_describes_the_signed_mean() {
        use clap::CommandFactory;

        let mut cmd = Cli::command();
        let help = cmd
            .find_subcommand_mut("mixed")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("default: signed mean of i"), "{help}");
        assert!(!help.contains("mean |i|"));
    }

    #[test]
    fn sweep_defaults_to_the_usual_weight_grid() {
        let cli = Cli::parse_from([
            "polfit", "sweep", "-i", "curve.csv", "--window", "-0.5", "0.15", "--w-dc", "-0.2",
        ]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let cfg = args.config();
        assert_eq!(cfg.w_dc, -0.2);
        assert_eq!(cfg.w_percent, SweepConfig::default_w_percent());
        assert!(cfg.w_ac.is_none());
    }

    #[test]
    fn explicit_sweep_lists_are_comma_separated() {
        let cli = Cli::parse_from([
            "polfit",
            "sweep",
            "-i",
            "curve.csv",
            "--window",
            "-0.5",
            "0.15",
            "--w-dc",
            "-0.2",
            "-W",
            "75,0",
            "--window-cathodic",
            "-0.3,-0.4",
        ]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let cfg = args.config();
        assert_eq!(cfg.w_percent, vec![75.0, 0.0]);
        assert_eq!(cfg.window_cathodic, Some(vec![-0.3, -0.4]));
    }
}
