/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use whitebox_shapefile::configs;
use whitebox_shapefile::utils::get_formatted_elapsed_time;
use whitebox_shapefile::{Shapefile, ShapefileError};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn help() {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let mut s: String = "Help:\n".to_owned();
    s.push_str("-i       Input shapefile.\n");
    s.push_str("-wd      Optional working directory. If specified, filenames parameters need not include a full path.\n");
    s.push_str("-v       Verbose mode.\n");
    s.push_str("-version Prints the tool version number.\n");
    s.push_str("-h       Prints help information.\n\n");
    s.push_str("Example usage:\n\n");
    s.push_str(&">> .*shp_info -wd *path*to*data* -i input.shp\n".replace("*", &sep));
    s.push_str(&">> .*shp_info -i *path*to*data*input.shp -v\n".replace("*", &sep));
    println!("{}", s);
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let configs = configs::get_configs()?;
    let mut verbose = configs.verbose_mode;
    let mut input_file = String::new();
    let mut working_directory = String::new();
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        help();
        return Ok(());
    }
    let value = |i: usize, vec: &[&str]| -> Result<String, Error> {
        if vec.len() > 1 {
            Ok(vec[1].to_string())
        } else {
            args.get(i + 1).cloned().ok_or_else(|| {
                Error::new(ErrorKind::InvalidInput, format!("No value given for {}", vec[0]))
            })
        }
    };
    for i in 1..args.len() {
        let arg = args[i].replace("\"", "").replace("\'", "");
        let vec = arg.split("=").collect::<Vec<&str>>(); // in case an equals sign was used
        let flag = vec[0].to_lowercase();
        if flag == "-i" || flag == "--i" || flag == "--input" {
            input_file = value(i, &vec)?;
        } else if flag == "-wd" || flag == "--wd" {
            working_directory = value(i, &vec)?;
        } else if flag == "-v" || flag == "--verbose" {
            verbose = true;
        } else if flag == "-h" || flag == "--help" || flag == "--h" {
            help();
            return Ok(());
        } else if flag == "-version" || flag == "--version" {
            const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
            println!("shp_info v{}", VERSION.unwrap_or("unknown"));
            return Ok(());
        }
    }

    if input_file.is_empty() {
        return Err(Box::new(Error::new(
            ErrorKind::InvalidInput,
            "No input file was specified (-i).",
        )));
    }

    if verbose {
        println!("***********************");
        println!("* Welcome to shp_info *");
        println!("***********************");
    }

    let sep = path::MAIN_SEPARATOR;
    if !working_directory.is_empty() && !working_directory.ends_with(sep) {
        working_directory.push_str(&(sep.to_string()));
    }
    if !input_file.contains(sep) {
        input_file = format!("{}{}", working_directory, input_file);
    }

    let start = Instant::now();
    let input = Shapefile::open_with(&input_file, &configs)?;
    println!("{}", input.header());
    println!("\nShape type: {}", input.shape_type());
    println!("Coordinates: {}", input.coordinate_profile());
    println!("Number of records: {}", input.shape_count());
    if !input.projection().is_empty() {
        println!("Projection: {}", input.projection());
    }

    let mut num_null = 0usize;
    let mut num_unreadable = 0usize;
    println!("\nRecord  Parts  Points");
    for i in 0..input.shape_count() {
        match input.get_shape(i) {
            Ok(shape) => {
                if shape.is_null() {
                    num_null += 1;
                    println!("{:>6}  null", i + 1);
                } else {
                    println!("{:>6}  {:>5}  {:>6}", i + 1, shape.num_parts(), shape.num_points());
                }
            }
            Err(e) if e.is_skippable() || matches!(e, ShapefileError::RecordUnavailable { .. }) => {
                num_unreadable += 1;
                println!("{:>6}  unreadable: {}", i + 1, e);
            }
            Err(e) => return Err(Box::new(e)),
        }
    }
    println!("\nNull records: {}", num_null);
    if num_unreadable > 0 {
        println!("Unreadable records: {}", num_unreadable);
    }

    if verbose {
        println!("\nElapsed Time: {}", get_formatted_elapsed_time(start));
    }
    Ok(())
}
