//! Minimal CLI for dealing and reconstructing ISN shares.
//!
//! Every command reads a JSON policy (see `isn_sharing::config`) that fixes
//! the group and the access structure.  Shares travel as the JSON list
//! written by `isn deal`.

use isn_sharing::{
    access::{AccessStructure, UnanimityAccessStructure},
    additive,
    config::{GroupConfig, Policy, PolicyConfig},
    io::{read_json, write_json},
    scheme::Scheme,
    share::{DealerOutput, Secret, Share},
    Bn254Scalar, Bn254ScalarGroup, Field, FieldElement, FiniteGroup, ImmutableBitSet, PartyId,
    SharingError, SimplePrng,
};
use rand::{rngs::OsRng, RngCore};
use std::{
    env,
    fmt::Display,
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ISN_LOG";
const SEED_ENV: &str = "ISN_SEED";

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_help() {
    println!("Usage: isn <deal|reconstruct|inspect|to-additive> ...");
    println!("  deal --policy <file> (--secret <value> | --random) [--out <file>]");
    println!("  reconstruct --policy <file> --shares <file> [--ids 1,3]");
    println!("  inspect --shares <file>");
    println!("  to-additive --policy <file> --shares <file> --quorum 1,3");
    println!();
    println!("Values are decimal for field policies and hex for bn254 policies.");
    println!("{SEED_ENV}=<u64> makes dealing reproducible; {LOG_ENV} sets the log filter.");
}

/// Group-specific parsing and printing of command-line values.
trait CliGroup: FiniteGroup {
    fn parse_value(&self, raw: &str) -> Result<Self::Element, SharingError>;
}

impl CliGroup for Field {
    fn parse_value(&self, raw: &str) -> Result<FieldElement, SharingError> {
        let value: u64 = raw
            .parse()
            .map_err(|_| SharingError::InvalidArgument(format!("not a decimal value: {raw}")))?;
        if value >= self.modulus() {
            return Err(SharingError::InvalidArgument(format!(
                "{value} is not below the modulus {}",
                self.modulus()
            )));
        }
        Ok(self.element(value))
    }
}

impl CliGroup for Bn254ScalarGroup {
    fn parse_value(&self, raw: &str) -> Result<Bn254Scalar, SharingError> {
        Bn254Scalar::from_hex(raw)
    }
}

#[derive(Default)]
struct Options {
    policy: Option<PathBuf>,
    shares: Option<PathBuf>,
    out: Option<PathBuf>,
    secret: Option<String>,
    random: bool,
    ids: Option<ImmutableBitSet>,
    quorum: Option<ImmutableBitSet>,
}

fn parse_ids(flag: &str, raw: &str) -> ImmutableBitSet {
    let ids: Vec<PartyId> = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse()
                .unwrap_or_else(|_| fatal(&format!("invalid {flag} entry: {part}")))
        })
        .collect();
    ImmutableBitSet::try_from_ids(ids).unwrap_or_else(|err| fatal(&format!("{flag}: {err}")))
}

fn parse_options(args: Vec<String>) -> Options {
    let mut opts = Options::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .unwrap_or_else(|| fatal(&format!("{flag} expects a value")))
        };
        match arg.as_str() {
            "--policy" => opts.policy = Some(PathBuf::from(value("--policy"))),
            "--shares" => opts.shares = Some(PathBuf::from(value("--shares"))),
            "--out" => opts.out = Some(PathBuf::from(value("--out"))),
            "--secret" => opts.secret = Some(value("--secret")),
            "--random" => opts.random = true,
            "--ids" => opts.ids = Some(parse_ids("--ids", &value("--ids"))),
            "--quorum" => opts.quorum = Some(parse_ids("--quorum", &value("--quorum"))),
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => fatal(&format!("unknown argument: {other}")),
        }
    }
    opts
}

fn make_rng() -> Box<dyn RngCore> {
    match env::var(SEED_ENV) {
        Ok(raw) => {
            let seed: u64 = raw
                .parse()
                .unwrap_or_else(|_| fatal(&format!("{SEED_ENV} must be a u64")));
            Box::new(SimplePrng::new(seed))
        }
        Err(_) => Box::new(OsRng),
    }
}

fn load_policy(opts: &Options) -> (GroupConfig, Policy) {
    let path = opts
        .policy
        .as_deref()
        .unwrap_or_else(|| fatal("--policy is required"));
    let config = PolicyConfig::from_path(path).unwrap_or_else(|err| fatal(&err.to_string()));
    let policy = config
        .build_access()
        .unwrap_or_else(|err| fatal(&format!("invalid policy: {err}")));
    (config.group, policy)
}

fn require_shares(opts: &Options) -> &Path {
    opts.shares
        .as_deref()
        .unwrap_or_else(|| fatal("--shares is required"))
}

fn run<G>(command: &str, group: G, policy: Policy, opts: &Options) -> Result<(), SharingError>
where
    G: CliGroup,
    G::Element: Display + serde::Serialize + serde::de::DeserializeOwned,
{
    let scheme = Scheme::new(group, policy)?;
    match command {
        "deal" => {
            let mut rng = make_rng();
            let output = match (&opts.secret, opts.random) {
                (Some(raw), false) => {
                    let secret = Secret::new(scheme.group().parse_value(raw)?);
                    scheme.deal(&secret, &mut rng)?
                }
                (None, true) => {
                    let (secret, output) = scheme.deal_random(&mut rng)?;
                    println!("secret: {}", secret.value());
                    output
                }
                _ => fatal("deal expects exactly one of --secret or --random"),
            };
            match &opts.out {
                Some(path) => {
                    write_json(path, &output)?;
                    println!(
                        "{}: wrote {} shares to {}",
                        scheme.variant_name(),
                        output.len(),
                        path.display()
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&output)?),
            }
        }
        "reconstruct" => {
            let output: DealerOutput<G::Element> = read_json(require_shares(opts))?;
            let coalition = opts.ids.unwrap_or_else(|| output.ids());
            let secret = scheme.reconstruct(output.select_exact(&coalition)?)?;
            println!("{}", secret.value());
        }
        "to-additive" => {
            let output: DealerOutput<G::Element> = read_json(require_shares(opts))?;
            let quorum = opts.quorum.unwrap_or_else(|| fatal("--quorum is required"));
            let target = UnanimityAccessStructure::new(quorum)?;
            let mut converted = Vec::new();
            for id in quorum.iter() {
                let share = output
                    .share(id)
                    .ok_or_else(|| SharingError::Membership(format!("no share for party {id}")))?;
                converted.push(scheme.share_to_additive(share, &target)?);
            }
            for share in &converted {
                println!("{}: {}", share.id, share.value);
            }
            let total = additive::reconstruct(scheme.group(), &converted)?;
            println!("sum: {total}");
        }
        other => fatal(&format!("unknown command: {other}")),
    }
    Ok(())
}

fn inspect(opts: &Options) -> Result<(), SharingError> {
    let shares: Vec<Share<serde_json::Value>> = read_json(require_shares(opts))?;
    for share in &shares {
        let clauses: Vec<String> = share.clauses().map(|c| c.to_string()).collect();
        println!(
            "party {}: {} pieces [{}]",
            share.id(),
            share.len(),
            clauses.join(" ")
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| {
        print_help();
        std::process::exit(1);
    });
    if command == "-h" || command == "--help" {
        print_help();
        return;
    }
    let opts = parse_options(args.collect());

    let result = match command.as_str() {
        "inspect" => inspect(&opts),
        "deal" | "reconstruct" | "to-additive" => {
            let (group, policy) = load_policy(&opts);
            tracing::debug!(shareholders = %policy.shareholders(), "loaded policy");
            match group {
                GroupConfig::Field { modulus } => match Field::try_new(modulus) {
                    Ok(field) => run(&command, field, policy, &opts),
                    Err(err) => Err(err),
                },
                GroupConfig::Bn254 => run(&command, Bn254ScalarGroup, policy, &opts),
            }
        }
        other => fatal(&format!("unknown command: {other}")),
    };
    if let Err(err) = result {
        fatal(&err.to_string());
    }
}
