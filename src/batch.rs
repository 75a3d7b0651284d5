//! Parallel conversion of many points with CSV input and output
//!
//! Every point is converted independently: a point that fails yields an
//! `Err` in its slot and the rest of the batch carries on. Results keep the
//! order of the input.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::ZoneCache;
use crate::error::{Error, Result};
use crate::projection::datum::Datum;
use crate::projection::flags::UtmFlags;
use crate::projection::utm::UtmConverter;
use crate::projection::utm_coord::{converter_for, UtmCoord};
use crate::types::{GeodeticPoint, Hemisphere};

/// Marker written in place of values for rows that failed to convert
pub const ERROR_CELL: &str = "ERROR";

/// UTM coordinates to convert back to geodetic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmInput {
    pub zone: u8,
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
}

/// One row of a geodetic CSV file, degrees
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl CsvPoint {
    pub fn to_geodetic(&self) -> GeodeticPoint {
        GeodeticPoint::from_degrees(self.latitude, self.longitude)
    }
}

/// One row of a UTM CSV file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvUtmRow {
    /// Kept as text so a bad zone fails only its own row
    pub zone: String,
    pub hemisphere: String,
    pub easting: f64,
    pub northing: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl CsvUtmRow {
    fn to_input(&self) -> Result<UtmInput> {
        let zone = self.zone.parse().map_err(|_| Error::Utm {
            flags: UtmFlags::ZONE_ERROR,
        })?;

        Ok(UtmInput {
            zone,
            hemisphere: self.hemisphere.parse()?,
            easting: self.easting,
            northing: self.northing,
        })
    }
}

/// Summary of a finished batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub execution_time_ms: f64,
    pub points_per_second: f64,
}

impl BatchStats {
    fn collect<T>(results: &[Result<T>], start: Instant) -> Self {
        let elapsed = start.elapsed().as_secs_f64();
        let successful = results.iter().filter(|result| result.is_ok()).count();

        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            execution_time_ms: elapsed * 1000.0,
            points_per_second: (successful as f64 / elapsed.max(f64::EPSILON)).round(),
        }
    }

    fn write_comments<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Statistics")?;
        writeln!(writer, "# Total points: {}", self.total)?;
        writeln!(writer, "# Successful: {}", self.successful)?;
        writeln!(writer, "# Failed: {}", self.failed)?;
        writeln!(writer, "# Execution time: {:.2} ms", self.execution_time_ms)?;
        writeln!(writer, "# Points per second: {:.0}", self.points_per_second)?;
        Ok(())
    }
}

/// Converts batches on one datum, sharing zone converters between points
#[derive(Debug, Clone)]
pub struct BatchConverter {
    converter: UtmConverter,
    datum: Datum,
}

impl BatchConverter {
    pub fn new(datum: Datum) -> Self {
        Self::with_cache(datum, ZoneCache::default())
    }

    /// Uses `cache` for zone converters, e.g. one shared by a server
    pub fn with_cache(datum: Datum, cache: ZoneCache) -> Self {
        Self {
            converter: converter_for(datum).with_cache(cache),
            datum,
        }
    }

    pub fn datum(&self) -> Datum {
        self.datum
    }

    /// Converts WGS-84 positions to UTM in parallel
    pub fn to_utm(&self, points: &[GeodeticPoint]) -> Vec<Result<UtmCoord>> {
        debug!("converting {} points to UTM on {}", points.len(), self.datum);
        points
            .par_iter()
            .map(|point| UtmCoord::project(&self.converter, self.datum, point.latitude, point.longitude))
            .collect()
    }

    /// Converts UTM coordinates to WGS-84 positions in parallel
    pub fn from_utm(&self, inputs: &[UtmInput]) -> Vec<Result<GeodeticPoint>> {
        debug!("converting {} points from UTM on {}", inputs.len(), self.datum);
        inputs
            .par_iter()
            .map(|input| {
                UtmCoord::unproject(
                    &self.converter,
                    self.datum,
                    input.zone,
                    input.hemisphere,
                    input.easting,
                    input.northing,
                )
                .map(|coord| coord.location())
            })
            .collect()
    }

    /// Reads `latitude,longitude[,name]` rows in degrees and writes their UTM
    /// coordinates, preceded by `#` statistics lines
    pub fn convert_csv<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<BatchStats> {
        let points = read_points(input)?;
        let start = Instant::now();

        let geodetic: Vec<GeodeticPoint> = points.iter().map(CsvPoint::to_geodetic).collect();
        let results = self.to_utm(&geodetic);
        let stats = BatchStats::collect(&results, start);

        stats.write_comments(&mut output)?;
        write_utm_results(&mut output, &points, &results)?;

        info!(
            "converted {} of {} points in {:.2} ms",
            stats.successful, stats.total, stats.execution_time_ms
        );
        Ok(stats)
    }

    /// Reads `zone,hemisphere,easting,northing[,name]` rows and writes their
    /// geodetic positions in degrees
    pub fn convert_utm_csv<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<BatchStats> {
        let rows = read_utm_rows(input)?;
        let start = Instant::now();

        let inputs: Vec<Result<UtmInput>> = rows.iter().map(CsvUtmRow::to_input).collect();
        let valid: Vec<UtmInput> = inputs.iter().filter_map(|input| input.as_ref().ok().copied()).collect();
        let mut converted = self.from_utm(&valid).into_iter();

        let results: Vec<Result<GeodeticPoint>> = inputs
            .into_iter()
            .map(|input| match input {
                Ok(_) => converted
                    .next()
                    .unwrap_or_else(|| Err(Error::InvalidInput("missing batch result".to_string()))),
                Err(e) => Err(e),
            })
            .collect();
        let stats = BatchStats::collect(&results, start);

        stats.write_comments(&mut output)?;
        write_geodetic_results(&mut output, &rows, &results)?;

        info!(
            "converted {} of {} UTM rows in {:.2} ms",
            stats.successful, stats.total, stats.execution_time_ms
        );
        Ok(stats)
    }
}

impl Default for BatchConverter {
    fn default() -> Self {
        Self::new(Datum::Wgs84)
    }
}

/// Converts WGS-84 positions to UTM with a fresh converter cache
pub fn to_utm_batch(points: &[GeodeticPoint], datum: Option<Datum>) -> Vec<Result<UtmCoord>> {
    BatchConverter::new(datum.unwrap_or_default()).to_utm(points)
}

/// Converts UTM coordinates to WGS-84 positions with a fresh converter cache
pub fn from_utm_batch(inputs: &[UtmInput]) -> Vec<Result<GeodeticPoint>> {
    BatchConverter::default().from_utm(inputs)
}

/// Parses geodetic CSV rows. Lines starting with `#` are skipped.
pub fn read_points<R: Read>(input: R) -> Result<Vec<CsvPoint>> {
    let mut reader = csv_reader(input);
    let mut points = Vec::new();

    for row in reader.deserialize() {
        points.push(row?);
    }

    Ok(points)
}

pub fn read_points_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CsvPoint>> {
    read_points(File::open(path)?)
}

/// Parses UTM CSV rows. Lines starting with `#` are skipped.
pub fn read_utm_rows<R: Read>(input: R) -> Result<Vec<CsvUtmRow>> {
    let mut reader = csv_reader(input);
    let mut rows = Vec::new();

    for row in reader.deserialize() {
        rows.push(row?);
    }

    Ok(rows)
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(input)
}

/// Writes converted rows, with `ERROR` cells where conversion failed
pub fn write_utm_results<W: Write>(
    output: W,
    points: &[CsvPoint],
    results: &[Result<UtmCoord>],
) -> Result<()> {
    let has_names = points.iter().any(|point| point.name.is_some());
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(output);

    let mut header = vec!["latitude", "longitude"];
    if has_names {
        header.push("name");
    }
    header.extend(["zone", "hemisphere", "easting", "northing"]);
    writer.write_record(&header)?;

    for (point, result) in points.iter().zip(results) {
        let mut record = vec![point.latitude.to_string(), point.longitude.to_string()];
        if has_names {
            record.push(point.name.clone().unwrap_or_default());
        }

        match result {
            Ok(coord) => record.extend([
                coord.zone.to_string(),
                coord.hemisphere.code().to_string(),
                format!("{:.3}", coord.easting),
                format!("{:.3}", coord.northing),
            ]),
            Err(_) => record.extend(std::iter::repeat(ERROR_CELL.to_string()).take(4)),
        }

        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes geodetic positions in degrees for UTM rows
pub fn write_geodetic_results<W: Write>(
    output: W,
    rows: &[CsvUtmRow],
    results: &[Result<GeodeticPoint>],
) -> Result<()> {
    let has_names = rows.iter().any(|row| row.name.is_some());
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(output);

    let mut header = vec!["zone", "hemisphere", "easting", "northing"];
    if has_names {
        header.push("name");
    }
    header.extend(["latitude", "longitude"]);
    writer.write_record(&header)?;

    for (row, result) in rows.iter().zip(results) {
        let mut record = vec![
            row.zone.clone(),
            row.hemisphere.clone(),
            row.easting.to_string(),
            row.northing.to_string(),
        ];
        if has_names {
            record.push(row.name.clone().unwrap_or_default());
        }

        match result {
            Ok(point) => record.extend([
                format!("{:.8}", point.latitude_degrees()),
                format!("{:.8}", point.longitude_degrees()),
            ]),
            Err(_) => record.extend([ERROR_CELL.to_string(), ERROR_CELL.to_string()]),
        }

        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let points = vec![
            GeodeticPoint::from_degrees(45.0, -75.0),
            GeodeticPoint::from_degrees(88.0, 0.0),
            GeodeticPoint::from_degrees(-33.9, 151.2),
        ];

        let results = to_utm_batch(&points, None);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().zone, 18);
        assert_eq!(
            results[1].as_ref().unwrap_err().utm_flags(),
            Some(UtmFlags::LAT_ERROR)
        );
        let sydney = results[2].as_ref().unwrap();
        assert_eq!(sydney.zone, 56);
        assert_eq!(sydney.hemisphere, Hemisphere::South);
    }

    #[test]
    fn test_from_utm_batch() {
        let inputs = vec![
            UtmInput {
                zone: 17,
                hemisphere: Hemisphere::North,
                easting: 500_000.0,
                northing: 0.0,
            },
            UtmInput {
                zone: 61,
                hemisphere: Hemisphere::North,
                easting: 500_000.0,
                northing: 0.0,
            },
        ];

        let results = from_utm_batch(&inputs);

        let origin = results[0].as_ref().unwrap();
        assert_abs_diff_eq!(origin.longitude_degrees(), -81.0, epsilon = 1e-9);
        assert_eq!(
            results[1].as_ref().unwrap_err().utm_flags(),
            Some(UtmFlags::ZONE_ERROR)
        );
    }

    #[test]
    fn test_batch_matches_single_conversion() {
        let points: Vec<GeodeticPoint> = (0..50)
            .map(|i| GeodeticPoint::from_degrees(-60.0 + i as f64 * 2.5, -170.0 + i as f64 * 7.0))
            .collect();
        let converter = BatchConverter::new(Datum::Nad27);

        for (point, result) in points.iter().zip(converter.to_utm(&points)) {
            let single = UtmCoord::from_lat_lon(point.latitude, point.longitude, Some(Datum::Nad27)).unwrap();
            assert_eq!(result.unwrap(), single);
        }
    }

    #[test]
    fn test_read_points() {
        let data = "# exported\nlatitude, longitude, name\n45.0, -75.0, ottawa\n-33.9,151.2,\n";
        let points = read_points(Cursor::new(data)).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name.as_deref(), Some("ottawa"));
        assert_eq!(points[1].latitude, -33.9);

        let bare = read_points(Cursor::new("latitude,longitude\n1,2\n")).unwrap();
        assert_eq!(bare[0].name, None);

        assert!(read_points(Cursor::new("latitude,longitude\nabc,2\n")).is_err());
    }

    #[test]
    fn test_convert_csv() {
        let input = "latitude,longitude,name\n45,-75,ottawa\n88,0,pole\n";
        let mut output = Vec::new();

        let stats = BatchConverter::default()
            .convert_csv(Cursor::new(input), &mut output)
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().filter(|line| !line.starts_with('#')).collect();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
        assert!(text.starts_with("# Statistics\n"));
        assert_eq!(lines[0], "latitude,longitude,name,zone,hemisphere,easting,northing");
        assert_eq!(lines[1], "45,-75,ottawa,18,N,500000.000,4982950.400");
        assert_eq!(lines[2], "88,0,pole,ERROR,ERROR,ERROR,ERROR");
    }

    #[test]
    fn test_convert_utm_csv() {
        let input = "zone,hemisphere,easting,northing\n17,N,500000,0\n17,X,500000,0\n31,S,500000,10000000\n";
        let mut output = Vec::new();

        let stats = BatchConverter::default()
            .convert_utm_csv(Cursor::new(input), &mut output)
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().filter(|line| !line.starts_with('#')).collect();

        assert_eq!(stats.successful, 2);
        assert_eq!(lines[0], "zone,hemisphere,easting,northing,latitude,longitude");
        assert_eq!(lines[1], "17,N,500000,0,0.00000000,-81.00000000");
        assert_eq!(lines[2], "17,X,500000,0,ERROR,ERROR");
        assert_eq!(lines[3], "31,S,500000,10000000,0.00000000,3.00000000");
    }

    #[test]
    fn test_bad_zone_fails_only_its_row() {
        let input = "zone,hemisphere,easting,northing\n300,N,500000,0\n-1,N,500000,0\n17,N,500000,0\n";
        let mut output = Vec::new();

        let stats = BatchConverter::default()
            .convert_utm_csv(Cursor::new(input), &mut output)
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().filter(|line| !line.starts_with('#')).collect();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 1);
        assert_eq!(lines[1], "300,N,500000,0,ERROR,ERROR");
        assert_eq!(lines[2], "-1,N,500000,0,ERROR,ERROR");
        assert_eq!(lines[3], "17,N,500000,0,0.00000000,-81.00000000");
    }

    #[test]
    fn test_csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("points.csv");
        let output_path = dir.path().join("utm.csv");
        std::fs::write(&input_path, "latitude,longitude\n52.52,13.405\n").unwrap();

        let input = File::open(&input_path).unwrap();
        let output = File::create(&output_path).unwrap();
        BatchConverter::default().convert_csv(input, output).unwrap();

        let written = std::fs::read_to_string(&output_path).unwrap();
        let row = written.lines().last().unwrap();
        assert!(row.starts_with("52.52,13.405,33,N,"));

        // statistics lines are comments to the reader
        let reread = read_points_from_path(&input_path).unwrap();
        assert_eq!(reread.len(), 1);
    }
}
