//! OPC UA numeric node address parsing.
//!
//! Node addresses use the `ns=<namespace>;i=<identifier>` form, e.g.
//! `ns=2;i=12345`. Only the numeric-identifier form is supported; string
//! and GUID identifiers do not occur in the station fleet.

use std::fmt;

use crate::error::CoreError;

/// A parsed `ns=<n>;i=<n>` node address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    pub namespace: u16,
    pub identifier: u32,
}

impl NodeAddress {
    /// Parse and validate a node address string.
    pub fn parse(s: &str) -> Result<NodeAddress, CoreError> {
        let invalid = || {
            CoreError::Validation(format!(
                "Node id '{s}' must use the format 'ns=<number>;i=<number>'"
            ))
        };

        let rest = s.strip_prefix("ns=").ok_or_else(invalid)?;
        let (ns_part, id_part) = rest.split_once(";i=").ok_or_else(invalid)?;

        let namespace: u16 = ns_part.parse().map_err(|_| invalid())?;
        let identifier: u32 = id_part.parse().map_err(|_| invalid())?;

        Ok(NodeAddress { namespace, identifier })
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};i={}", self.namespace, self.identifier)
    }
}

/// Validate a node address string without keeping the parsed form.
pub fn validate_node_id(s: &str) -> Result<(), CoreError> {
    NodeAddress::parse(s).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_addresses() {
        let addr = NodeAddress::parse("ns=2;i=12345").unwrap();
        assert_eq!(addr.namespace, 2);
        assert_eq!(addr.identifier, 12345);
        assert_eq!(addr.to_string(), "ns=2;i=12345");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "i=5", "ns=2", "ns=2;i=", "ns=;i=5", "ns=2;i=abc", "ns=two;i=5", "2;5"] {
            assert!(NodeAddress::parse(bad).is_err(), "'{bad}' should be rejected");
        }
    }
}
