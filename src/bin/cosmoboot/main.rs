//! Main entry point for the `cosmoboot` executable

use cosmoboot::application::APP;

/// Boot the `cosmoboot` application
fn main() {
    abscissa_core::boot(&APP);
}
