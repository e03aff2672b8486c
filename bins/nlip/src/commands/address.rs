//! nlip address command implementation.

use std::io::{self, Write};

use anyhow::Context;
use clap::{Args, Subcommand};
use nlroute::netlink::request::resolve_ifindex;
use nlroute::netlink::{AddressRecord, RequestSession, Transport};
use nlroute::util::{default_interface, name_to_index, parse_prefix};

use super::{Output, ifname_or_index};

#[derive(Args)]
pub struct AddressCmd {
    #[command(subcommand)]
    action: Option<AddressAction>,
}

#[derive(Subcommand)]
enum AddressAction {
    /// Show addresses.
    Show {
        /// Interface name.
        dev: Option<String>,
    },

    /// Add an address.
    Add {
        /// Address with prefix (e.g., 192.168.1.10/24).
        address: String,

        /// Device name (defaults to the first interface that is up).
        #[arg(long, short)]
        dev: Option<String>,
    },
}

impl AddressCmd {
    pub fn run<T: Transport>(
        self,
        session: &mut RequestSession<T>,
        output: Output,
        family: Option<u8>,
    ) -> anyhow::Result<()> {
        match self.action.unwrap_or(AddressAction::Show { dev: None }) {
            AddressAction::Show { dev } => Self::show(session, dev.as_deref(), output, family),
            AddressAction::Add { address, dev } => {
                Self::add(session, &address, dev.as_deref(), family)
            }
        }
    }

    fn show<T: Transport>(
        session: &mut RequestSession<T>,
        dev: Option<&str>,
        output: Output,
        family: Option<u8>,
    ) -> anyhow::Result<()> {
        let filter_index = dev
            .map(name_to_index)
            .transpose()
            .context("unknown device")?;

        let addresses: Vec<AddressRecord> = session
            .dump_addresses(family.unwrap_or(libc::AF_UNSPEC as u8))?
            .into_iter()
            .filter(|addr| filter_index.is_none_or(|idx| addr.ifindex() == idx))
            .collect();

        let mut stdout = io::stdout().lock();
        if output.json {
            return output.write_json(&mut stdout, &addresses);
        }

        // Group by interface
        let mut current_index = 0u32;
        for addr in &addresses {
            if addr.ifindex() != current_index {
                current_index = addr.ifindex();
                writeln!(stdout, "{}: {}:", current_index, ifname_or_index(current_index))?;
            }
            print_addr_text(&mut stdout, addr)?;
        }
        Ok(())
    }

    fn add<T: Transport>(
        session: &mut RequestSession<T>,
        address: &str,
        dev: Option<&str>,
        family: Option<u8>,
    ) -> anyhow::Result<()> {
        let prefix = parse_prefix(address, family)?;
        if prefix.is_default() {
            anyhow::bail!("{} is not a host address", address);
        }

        let explicit = dev
            .map(name_to_index)
            .transpose()
            .context("unknown device")?;
        let ifindex = resolve_ifindex(explicit, || default_interface().map(|(_, index)| index))?;

        tracing::debug!(address, ifindex, "adding address");
        session.add_address(prefix.family(), prefix.bit_len(), ifindex, prefix.bytes())?;
        Ok(())
    }
}

fn print_addr_text<W: Write>(w: &mut W, addr: &AddressRecord) -> io::Result<()> {
    let family = if addr.is_ipv4() { "inet" } else { "inet6" };
    write!(w, "    {}", family)?;

    if let Some(a) = addr.primary_address() {
        write!(w, " {}/{}", a, addr.prefix_len())?;
    }
    if let Some(peer) = addr.peer() {
        write!(w, " peer {}", peer)?;
    }
    if let Some(brd) = addr.broadcast() {
        write!(w, " brd {}", brd)?;
    }

    write!(w, " scope {}", addr.scope())?;

    if addr.is_secondary() {
        write!(w, " secondary")?;
    }
    if addr.is_temporary() && addr.is_ipv6() {
        write!(w, " temporary")?;
    }
    if addr.is_tentative() {
        write!(w, " tentative")?;
    }
    if addr.is_deprecated() {
        write!(w, " deprecated")?;
    }
    if let Some(label) = addr.label() {
        write!(w, " {}", label)?;
    }
    writeln!(w)?;

    if let Some(info) = addr.cache_info() {
        writeln!(
            w,
            "       valid_lft {} preferred_lft {}",
            info.valid, info.preferred
        )?;
    }
    Ok(())
}
