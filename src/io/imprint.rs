use crate::utils::Timer;
use chrono::{DateTime, Local};
use clap::{crate_name, crate_version};
use log::warn;

const LOG_WIDTH: usize = 80;

pub fn write_header() {
    let now: DateTime<Local> = Local::now();
    warn!("{: ^LOG_WIDTH$}", "-----------------");
    warn!("{: ^LOG_WIDTH$}", crate_name!().to_uppercase());
    warn!("{: ^LOG_WIDTH$}", "-----------------");
    warn!("{: ^LOG_WIDTH$}", format!("version: {}", crate_version!()));
    warn!("{: ^LOG_WIDTH$}", "");
    warn!("{: ^LOG_WIDTH$}", format!("{::^55}", ""));
    warn!(
        "{: ^LOG_WIDTH$}",
        "::    Bethe-Salpeter excitons of tight-binding models    ::"
    );
    warn!(
        "{: ^LOG_WIDTH$}",
        "::   RPA screening, exciton bands and optical spectra    ::"
    );
    warn!("{: ^LOG_WIDTH$}", format!("{::^55}", ""));
    warn!(
        "{: ^LOG_WIDTH$}",
        format!("started at: {}", now.format("%Y-%m-%d %H:%M:%S"))
    );
    warn!("{: ^LOG_WIDTH$}", "");
}

pub fn write_footer(timer: Timer) {
    warn!("{:>68} {:>8.2} s", "total elapsed time:", timer.elapsed());
    warn!("{: ^LOG_WIDTH$}", "");
    warn!("{: ^LOG_WIDTH$}", "::::::::::::::::::::::::::::::::::::::");
    warn!(
        "{: ^LOG_WIDTH$}",
        format!(
            "::   Thank you for using {}    ::",
            crate_name!().to_uppercase()
        )
    );
    warn!("{: ^LOG_WIDTH$}", "::::::::::::::::::::::::::::::::::::::");
    warn!("{: ^LOG_WIDTH$}", "");
}
