
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

pub mod compiler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use compiler::symbols::SymbolTable;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tTrace: {}\n\tOutfile: {}\n\tInfile: {}",
        verbosity(args.occurrences_of("verbose")),
        args.is_present("trace"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("None")
    );

    let ipath = match args.value_of("INPUT") {
        Some(name) => input_path(name),
        None => {
            error!("fatal: no input file given");
            std::process::exit(1);
        },
    };

    let ifile = match File::open(&ipath) {
        Err(err) => {
            error!("fatal: unable to open input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    let opath = match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None => ipath.with_extension("a"),
    };

    let ofile = match File::create(&opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    info!("compiling `{}` into `{}`", ipath.display(), opath.display());

    let outcome = compiler::compile(BufReader::new(ifile), args.is_present("trace"));

    if args.is_present("print-debug") {
        print_symbols(&outcome.symbols);
    }

    // Written even when compilation failed, so the partial listing shows
    // where the compiler stopped.
    let mut writer = BufWriter::new(ofile);
    let written = write!(writer, "{}{}", header(), outcome.listing)
        .and_then(|_| writer.flush());
    drop(writer);

    if let Err(err) = written {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }

    if let Some(err) = outcome.error {
        error!("{}", err);
        std::process::exit(1);
    }
}

/// Resolves the source file. A bare name with no extension that does not
/// exist is looked up as `<name>.s`.
fn input_path(name: &str) -> PathBuf {
    let path = Path::new(name);
    if !path.exists() && path.extension().is_none() {
        let with_ext = path.with_extension("s");
        if with_ext.exists() {
            return with_ext;
        }
    }
    path.to_path_buf()
}

/// Comment lines opening every output file.
fn header() -> String {
    format!("; {} {}    {}\n; Output from R1 compiler\n",
        option_env!("CARGO_PKG_NAME").unwrap_or("r1c"),
        option_env!("CARGO_PKG_VERSION").unwrap_or(""),
        chrono::Local::now().format("%a %b %e %H:%M:%S %Y"))
}

fn print_symbols(symbols: &SymbolTable) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(2),
        direction:   Direction::LeftToRight,
    });

    for (idx, sym) in symbols.iter().enumerate() {
        grid.add(Cell::from(format!("{:4}:", idx)));
        grid.add(Cell::from(sym.name.clone()));
        grid.add(Cell::from(format!("dw {}", sym.value)));
        grid.add(Cell::from(if sym.needs_data_word { "storage" } else { "-" }));
    }

    println!("{}", grid.fit_into_columns(4));
}

fn process_arguments() -> ArgMatches<'static> {
    app().get_matches()
}

fn app() -> App<'static, 'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("r1c"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or(""))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
        .arg(Arg::with_name("INPUT")
            .help("Sets the R1 source file to compile (`prog` also finds `prog.s`)")
            .required(true)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile (default: the input with extension `.a`)"))
        .arg(Arg::with_name("trace")
            .short("t")
            .takes_value(false)
            .help("records every token in the output as a comment"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .takes_value(false)
            .help("prints the symbol table to STDOUT"))
}

fn verbosity(occurrences: u64) -> log::LevelFilter {
    match occurrences {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn initialize_logging(occurrences: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(verbosity(occurrences))
        .chain(std::io::stderr())
        .apply().ok();
}
