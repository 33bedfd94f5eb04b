extern crate env_logger;
extern crate ridley;

use log::{error, info};
use ridley::{ChefError, Connection, Resources};
use std::env;
use std::process;

fn report(profile: Option<&str>) -> Result<(), ChefError> {
    let connection = Connection::from_credentials(profile)?;
    let nodes = connection.with_session(|session| session.node().all())?;
    info!("Found {} nodes", nodes.len());

    for node in nodes {
        println!(
            "{}\t{}\t{}\t{}",
            node.name,
            node.chef_environment,
            node.public_hostname().unwrap_or("-"),
            node.public_ipv4().unwrap_or("-"),
        );
    }
    Ok(())
}

pub fn main() {
    env_logger::init();
    let profile = env::args().nth(1);

    if let Err(e) = report(profile.as_deref()) {
        error!("{}", e);
        eprintln!("node_report: {}", e);
        process::exit(1);
    }
}
