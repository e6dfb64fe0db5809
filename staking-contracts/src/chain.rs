use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

pub const MONAD_CHAIN_ID: u64 = 143;
pub const MONAD_RPC_URL: &str = "https://rpc.monad.xyz";
pub const MONAD_EXPLORER_URL: &str = "https://explorer.monad.xyz";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
}

/// Network the staking contracts are deployed on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainDescriptor {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer: BlockExplorer,
}

impl ChainDescriptor {
    pub fn monad() -> ChainDescriptor {
        ChainDescriptor {
            id: MONAD_CHAIN_ID,
            name: "Monad".to_owned(),
            native_currency: NativeCurrency {
                name: "MON".to_owned(),
                symbol: "MON".to_owned(),
                decimals: 18,
            },
            rpc_urls: vec![MONAD_RPC_URL.to_owned()],
            block_explorer: BlockExplorer {
                name: "Monad Explorer".to_owned(),
                url: MONAD_EXPLORER_URL.to_owned(),
            },
        }
    }

    /// First configured RPC endpoint, reads go here.
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(|url| url.as_str())
    }

    pub fn tx_url(&self, hash: &B256) -> String {
        format!("{}/tx/{}", self.explorer_base(), hash)
    }

    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{}", self.explorer_base(), address)
    }

    /// "Monad (143)", as shown next to the wallet button and in network errors.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    fn explorer_base(&self) -> &str {
        self.block_explorer.url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn monad_descriptor() {
        let chain = ChainDescriptor::monad();
        assert_eq!(chain.id, 143);
        assert_eq!(chain.rpc_url(), Some("https://rpc.monad.xyz"));
        assert_eq!(chain.label(), "Monad (143)");
    }

    #[test]
    fn explorer_links_ignore_trailing_slash() {
        let mut chain = ChainDescriptor::monad();
        chain.block_explorer.url = "https://explorer.monad.xyz/".to_owned();
        let hash = b256!("00000000000000000000000000000000000000000000000000000000000000aa");
        assert_eq!(
            chain.tx_url(&hash),
            "https://explorer.monad.xyz/tx/0x00000000000000000000000000000000000000000000000000000000000000aa"
        );
    }
}
