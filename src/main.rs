use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use utmkit::batch::BatchConverter;
use utmkit::{Datum, Ellipsoid, Hemisphere, Result, TmCoord, TmParameters, UtmCoord};

/// Convert coordinates between geodetic, UTM and Transverse Mercator
#[derive(Debug, StructOpt)]
#[structopt(name = "utmkit")]
enum Command {
    /// Geodetic position (degrees) to UTM
    ToUtm {
        /// latitude in degrees
        #[structopt(long, allow_hyphen_values = true)]
        lat: f64,

        /// longitude in degrees
        #[structopt(long, allow_hyphen_values = true)]
        lon: f64,

        /// WGS84 or NAD27
        #[structopt(long, default_value = "WGS84")]
        datum: Datum,
    },

    /// UTM coordinates to a geodetic position
    FromUtm {
        #[structopt(long)]
        zone: u8,

        /// N or S
        #[structopt(long)]
        hemisphere: Hemisphere,

        #[structopt(long)]
        easting: f64,

        #[structopt(long)]
        northing: f64,

        #[structopt(long, default_value = "WGS84")]
        datum: Datum,
    },

    /// Geodetic position (degrees) to a custom Transverse Mercator grid on WGS84
    ToTm {
        #[structopt(long, allow_hyphen_values = true)]
        lat: f64,

        #[structopt(long, allow_hyphen_values = true)]
        lon: f64,

        /// central meridian in degrees
        #[structopt(long, allow_hyphen_values = true)]
        central_meridian: f64,

        /// latitude of origin in degrees
        #[structopt(long, default_value = "0", allow_hyphen_values = true)]
        origin_lat: f64,

        #[structopt(long, default_value = "500000", allow_hyphen_values = true)]
        false_easting: f64,

        #[structopt(long, default_value = "0", allow_hyphen_values = true)]
        false_northing: f64,

        #[structopt(long, default_value = "0.9996")]
        scale: f64,
    },

    /// Convert a CSV file of points
    Batch {
        /// CSV with latitude,longitude[,name] columns in degrees
        #[structopt(long, parse(from_os_str))]
        input: PathBuf,

        /// Output CSV, stdout when omitted
        #[structopt(long, parse(from_os_str))]
        output: Option<PathBuf>,

        #[structopt(long, default_value = "WGS84")]
        datum: Datum,

        /// Input holds zone,hemisphere,easting,northing rows instead
        #[structopt(long)]
        from_utm: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Command::from_args()) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::ToUtm { lat, lon, datum } => {
            let coord = UtmCoord::from_lat_lon(lat.to_radians(), lon.to_radians(), Some(datum))?;
            println!("{}", coord);
            println!("  zone:             {}{}", coord.zone, coord.hemisphere);
            println!("  easting:          {:15.3} m", coord.easting);
            println!("  northing:         {:15.3} m", coord.northing);
            println!("  central meridian: {:11.6} °", coord.central_meridian.to_degrees());
        }
        Command::FromUtm {
            zone,
            hemisphere,
            easting,
            northing,
            datum,
        } => {
            let coord = UtmCoord::from_utm(zone, hemisphere, easting, northing, Some(datum))?;
            println!("{}", coord);
            println!("  latitude:  {:11.6} °", coord.latitude.to_degrees());
            println!("  longitude: {:11.6} °", coord.longitude.to_degrees());
        }
        Command::ToTm {
            lat,
            lon,
            central_meridian,
            origin_lat,
            false_easting,
            false_northing,
            scale,
        } => {
            let parameters = TmParameters {
                origin_latitude: origin_lat.to_radians(),
                central_meridian: central_meridian.to_radians(),
                false_easting,
                false_northing,
                scale_factor: scale,
            };
            let coord = TmCoord::from_lat_lon(
                lat.to_radians(),
                lon.to_radians(),
                Ellipsoid::default(),
                parameters,
            )?;
            println!("{}", coord);
        }
        Command::Batch {
            input,
            output,
            datum,
            from_utm,
        } => {
            let converter = BatchConverter::new(datum);
            let input = File::open(&input)?;

            let stats = match output {
                Some(path) => {
                    let output = File::create(path)?;
                    convert(&converter, input, output, from_utm)?
                }
                None => convert(&converter, input, io::stdout().lock(), from_utm)?,
            };

            eprintln!(
                "{} points, {} converted, {} failed ({:.2} ms)",
                stats.total, stats.successful, stats.failed, stats.execution_time_ms
            );
        }
    }

    Ok(())
}

fn convert<W: io::Write>(
    converter: &BatchConverter,
    input: File,
    output: W,
    from_utm: bool,
) -> Result<utmkit::batch::BatchStats> {
    if from_utm {
        converter.convert_utm_csv(input, output)
    } else {
        converter.convert_csv(input, output)
    }
}
