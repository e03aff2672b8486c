//! nlip route command implementation.

use std::io::{self, Write};

use clap::{Args, Subcommand};
use nlroute::netlink::types::addr::Scope;
use nlroute::netlink::types::route::{RT_TABLE_MAIN, protocol_name, route_type_name, rtn};
use nlroute::netlink::{RequestSession, RouteFilter, RouteRecord, Transport};
use nlroute::util::index_to_name;

use super::Output;

#[derive(Args)]
pub struct RouteCmd {
    #[command(subcommand)]
    action: Option<RouteAction>,
}

#[derive(Args, Clone, Copy)]
struct TableArgs {
    /// Routing table id.
    #[arg(long, default_value_t = RT_TABLE_MAIN)]
    table: u32,

    /// Fail on routes from another family or table instead of skipping them.
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum RouteAction {
    /// Show routes.
    Show {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Show the first route with a gateway.
    Gateway {
        #[command(flatten)]
        table: TableArgs,
    },
}

impl TableArgs {
    fn filter(self, family: u8) -> RouteFilter {
        let filter = RouteFilter::main(family).table(self.table);
        if self.strict { filter } else { filter.permissive() }
    }
}

fn resolve_name(index: u32) -> Option<String> {
    index_to_name(index).ok()
}

impl RouteCmd {
    pub fn run<T: Transport>(
        self,
        session: &mut RequestSession<T>,
        output: Output,
        family: Option<u8>,
    ) -> anyhow::Result<()> {
        let family = family.unwrap_or(libc::AF_INET as u8);
        let action = self.action.unwrap_or(RouteAction::Show {
            table: TableArgs {
                table: RT_TABLE_MAIN,
                strict: false,
            },
        });

        let mut stdout = io::stdout().lock();
        match action {
            RouteAction::Show { table } => {
                let routes = session.dump_routes(&table.filter(family), &resolve_name)?;
                if output.json {
                    return output.write_json(&mut stdout, &routes);
                }
                for route in &routes {
                    print_route_text(&mut stdout, route)?;
                }
            }
            RouteAction::Gateway { table } => {
                let Some(route) = session.first_gateway(&table.filter(family), &resolve_name)?
                else {
                    anyhow::bail!("no gateway route in table {}", table.table);
                };
                if output.json {
                    return output.write_json(&mut stdout, &route);
                }
                print_route_text(&mut stdout, &route)?;
            }
        }
        Ok(())
    }
}

fn print_route_text<W: Write>(w: &mut W, route: &RouteRecord) -> io::Result<()> {
    if route.route_type() != rtn::UNICAST {
        write!(w, "{} ", route_type_name(route.route_type()))?;
    }

    match route.destination() {
        Some(dst) => write!(w, "{}/{}", dst, route.dst_len())?,
        None if route.dst_len() == 0 => write!(w, "default")?,
        None => write!(w, "0/{}", route.dst_len())?,
    }

    if let Some(gw) = route.gateway() {
        write!(w, " via {}", gw)?;
    }
    match (route.oif_name(), route.oif()) {
        (Some(name), _) => write!(w, " dev {}", name)?,
        (None, Some(index)) => write!(w, " dev if{}", index)?,
        (None, None) => {}
    }

    write!(w, " proto {}", protocol_name(route.protocol()))?;
    if route.scope() != Scope::Global {
        write!(w, " scope {}", route.scope())?;
    }
    if let Some(src) = route.prefsrc() {
        write!(w, " src {}", src)?;
    }
    if let Some(metric) = route.priority() {
        write!(w, " metric {}", metric)?;
    }
    writeln!(w)
}
