mod app;

use std::path::Path;
use std::process;

use log::{error, info};

use fund_peps::accounting::accountant::Accountant;
use fund_peps::accounting::reports::{report_files, ReportWriter};
use fund_peps::accounting::FundType;
use fund_peps::config::Config;

use crate::app::App;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = App::new();
    info!("processing {}", app.get_input_path());

    let mut config = Config::load_or_default(app.get_config_path()).unwrap_or_else(|e| {
        error!("Unable to read config file \"{}\": {}", app.get_config_path(), e);
        process::exit(1);
    });
    if let Some(output_path) = app.get_output_path() {
        config.set_output_dir(output_path);
    }

    let fund_type = app.get_fund_type().map(|label| {
        label.parse::<FundType>().unwrap_or_else(|e| {
            error!("{}", e);
            process::exit(1);
        })
    });

    let accountant = Accountant::new(&config);
    let report = accountant
        .analyze_file(Path::new(app.get_input_path()))
        .unwrap_or_else(|e| {
            error!("Unable to process \"{}\": {}", app.get_input_path(), e);
            process::exit(1);
        });

    let mut writer = ReportWriter::new(config.output_dir(), config.decimal_places());
    if let Some(fund_type) = fund_type {
        writer = writer.fund_type(fund_type);
    }
    let output_dir = writer
        .render(&report.operations, &report.positions, &report.analyses)
        .unwrap_or_else(|e| {
            error!("Unable to write reports: {}", e);
            process::exit(1);
        });

    for file in report_files(&output_dir) {
        info!("wrote {}", file.display());
    }
    info!(
        "{}: {} operations, {} positions, {} funds, realized {}",
        report.source_reference,
        report.operations.len(),
        report.positions.len(),
        report.analyses.len(),
        report.total_gain_loss().round_dp(config.decimal_places())
    );
}
