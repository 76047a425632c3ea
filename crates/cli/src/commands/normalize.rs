//! Print the cache key for an address.

use pinmap_core::normalize;

/// Print the normalized form of `address`.
pub fn run(address: &str) {
    #[allow(clippy::print_stdout)]
    {
        println!("{}", normalize(address));
    }
}
