//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("isoprobe")
        .about("Races two conditional inserts to detect phantom reads")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file (see `isoprobe config`)")
                .global(true),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .value_parser(["memory", "sqlite"])
                .help("Database to probe (default: memory)")
                .global(true),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .help("SQLite database file; implies --backend sqlite")
                .global(true),
        )
        .arg(
            Arg::new("isolation")
                .long("isolation")
                .value_name("LEVEL")
                .help("Isolation of the explicit transactions, e.g. read-committed")
                .global(true),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("Lock contention outcomes to observe (default: 1)")
                .global(true),
        )
        .arg(
            Arg::new("max-trials")
                .long("max-trials")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("Give up after this many trials (default: 10000)")
                .global(true),
        )
        .arg(
            Arg::new("timing")
                .long("timing")
                .help("Skip the barrier and rely on start-up timing alone")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("explicit-primary")
                .long("explicit-primary")
                .help("Run the primary insert in an explicit transaction")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("worker-delay-ms")
                .long("worker-delay-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Worker sleep between rendezvous and insert (default: 1)")
                .global(true),
        )
        .arg(
            Arg::new("read-write-gap-ms")
                .long("read-write-gap-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Memory backend: pause between existence check and insert")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("run").about("Race until the lock contention target is reached"),
        )
        .subcommand(
            Command::new("sample")
                .about("Race a fixed number of times and report the tallies")
                .arg(
                    Arg::new("trials")
                        .long("trials")
                        .short('n')
                        .value_name("N")
                        .value_parser(value_parser!(u64))
                        .default_value("100")
                        .help("Number of trials"),
                ),
        )
        .subcommand(Command::new("config").about("Print the default configuration file"))
}
