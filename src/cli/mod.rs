use std::fs::canonicalize;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::cli::args::Args;
use crate::config::{parse_decode_config, DecodeConfig};
use crate::plan::{ComponentReport, DecodePlan, DecodeReport};
use crate::tech::{parse_tech, TechParams};

pub mod args;

pub const BANNER: &str = r"
     _                               _      _
  __| | ___  ___ _ __ ___   ___   __| | ___| |
 / _` |/ _ \/ __| '_ ` _ \ / _ \ / _` |/ _ \ |
| (_| |  __/ (__| | | | | | (_) | (_| |  __/ |
 \__,_|\___|\___|_| |_| |_|\___/ \__,_|\___|_|

DECMODEL v0.2
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    let config_path = canonicalize(&args.config)?;
    let config = parse_decode_config(&config_path)?;
    let tech = match &args.tech {
        Some(path) => parse_tech(canonicalize(path)?)?,
        None => config.tech(),
    };

    let plan = DecodePlan::new(&config, &tech)?;
    let report = plan.evaluate();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{BANNER}");
    println!("Configuration file: {:?}", &config_path);
    print_config(&config, &tech);
    print_report(&report);

    Ok(())
}

fn print_config(config: &DecodeConfig, tech: &TechParams) {
    println!("Decoder parameters:");
    println!("\tNumber of rows: {}", config.num_rows);
    println!("\tWay select bits: {}", config.way_select);
    println!(
        "\tCell: {} x {} um ({})",
        config.cell.h, config.cell.w, tech.cell_design
    );
    println!("\tWordline load: {:.3e} F, {:.1} ohm", config.wordline.c, config.wordline.r);
    if tech.cell_design.has_read_wordline() {
        let rd = config.read_wordline.unwrap_or(config.wordline);
        println!("\tRead wordline load: {:.3e} F, {:.1} ohm", rd.c, rd.r);
    }
    println!();
}

fn print_row(name: &str, part: &ComponentReport) {
    println!(
        "  {:20} {:>12.3e} {:>12.3e} {:>12.3e} {:>12.3e} {:>12.3e}",
        name, part.delay, part.rise_time, part.area, part.power.dynamic, part.power.leakage
    );
}

fn print_report(report: &DecodeReport) {
    println!(
        "  {:20} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Component".bold(),
        "Delay (s)".bold(),
        "Rise (s)".bold(),
        "Area (um2)".bold(),
        "Energy (J)".bold(),
        "Leakage (W)".bold()
    );
    if let Some(drv) = &report.input_driver {
        print_row("Input driver", drv);
    }
    print_row("Predecoder", &report.predecoder);
    if let Some(drv) = &report.way_select_driver {
        print_row("Way select driver", drv);
    }
    print_row("Decoder", &report.decoder);

    if let Some(critical) = report.critical {
        println!(
            "\nCritical predecode path: {:?} block, {} path",
            critical.half, critical.path
        );
    }
    if report.decoder_timing.delay_rd > 0.0 {
        println!(
            "Write wordline delay: {:.3e} s, read wordline delay: {:.3e} s",
            report.decoder_timing.delay, report.decoder_timing.delay_rd
        );
    }

    println!(
        "\n{} {:.3e} s",
        "Access delay:".green().bold(),
        report.access_delay
    );
    println!("{} {:.3e} um2", "Area:".green().bold(), report.area);
    println!(
        "{} {:.3e} J/read, {:.3e} W leakage",
        "Power:".green().bold(),
        report.power.dynamic,
        report.power.leakage
    );
}
