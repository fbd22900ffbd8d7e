//! Address table handler.

use tabled::Tabled;

use netdesk_core::{AddressEntry, HttpConsole};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct AddressRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Lease")]
    lease: String,
    #[tabled(rename = "Throughput")]
    throughput: String,
    #[tabled(rename = "Binding")]
    binding: String,
}

impl From<&AddressEntry> for AddressRow {
    fn from(e: &AddressEntry) -> Self {
        let binding = match e.mac_binding {
            Some(ref bound) if e.binding_mismatch() => format!("{bound} (mismatch)"),
            Some(ref bound) => bound.to_string(),
            None => "-".into(),
        };
        Self {
            address: if e.public {
                format!("{} (public)", e.address)
            } else {
                e.address.to_string()
            },
            hostname: e.hostname.clone(),
            mac: e.mac.as_ref().map_or_else(|| "-".into(), ToString::to_string),
            vendor: e.vendor.clone().unwrap_or_else(|| "-".into()),
            status: e.status.to_string(),
            lease: e.lease_age.clone(),
            throughput: e.throughput.clone(),
            binding,
        }
    }
}

pub fn handle(console: &HttpConsole, global: &GlobalOpts) -> Result<(), CliError> {
    let state = console.state();
    let table = state.addresses();
    let out = output::render_list(
        global.output,
        table.entries(),
        |e| AddressRow::from(e),
        |e| e.address.to_string(),
    )?;
    output::print_output(&out, global.quiet);

    let mismatched = table.mismatched_bindings().count();
    if mismatched > 0 && !global.quiet {
        eprintln!("{mismatched} address(es) seen with a MAC other than the bound one");
    }
    Ok(())
}
