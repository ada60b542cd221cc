use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;

use clap::{App, Arg};
use consistent_ring::{HashRing, DEFAULT_REPLICAS};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let default_vnodes = DEFAULT_REPLICAS.to_string();
    let matches = App::new("bench")
        .arg(Arg::with_name("WORD_FILE").index(1).required(true))
        .arg(
            Arg::with_name("NODES")
                .long("nodes")
                .required(true)
                .takes_value(true)
                .min_values(1)
                .multiple(true),
        )
        .arg(
            Arg::with_name("VNODE_COUNT")
                .long("vnode_count")
                .takes_value(true)
                .default_value(&default_vnodes),
        )
        .get_matches();

    let filepath = matches.value_of("WORD_FILE").unwrap();
    let words: Vec<String> = BufReader::new(File::open(filepath).expect("Cannot open file"))
        .lines()
        .collect::<Result<_, _>>()
        .expect("Cannot read words");
    println!("WORD COUNT: {}", words.len());

    let vnodes: usize = matches
        .value_of("VNODE_COUNT")
        .unwrap()
        .parse()
        .expect("Wrong integer");
    let ring = HashRing::with_replicas(vnodes);
    ring.add_nodes(matches.values_of("NODES").unwrap());
    println!("REAL NODE COUNT: {}", ring.len());
    println!(
        "VIRTUAL NODE COUNT: {} ({} per node)",
        ring.vnode_count(),
        ring.replicas()
    );

    let start_time = Instant::now();
    for word in words.iter() {
        ring.get_node(word).unwrap();
    }
    let elapsed = start_time.elapsed();

    let mut counts: HashMap<String, usize> = ring.nodes().into_iter().map(|n| (n, 0)).collect();
    for word in words.iter() {
        let selected = ring.get_node(word).unwrap();
        *counts.get_mut(&selected).unwrap() += 1;
    }

    println!();
    println!("SELECTED COUNT PER NODE:");
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort();
    for (node, count) in counts {
        println!("- {}: \t{}", node, count);
    }
    println!();

    let elapsed_micros = elapsed.as_micros().max(1) as f64;
    println!("ELAPSED: {} ms", elapsed.as_millis());
    println!(
        "WORDS PER SECOND: {}",
        ((words.len() as f64 / elapsed_micros) * 1_000_000.0) as u64
    );
}
