//! Reference deployment of the full game.
//!
//! Order: create the circle token with the proxy as minter, create the
//! proxy, deploy every module, then bind all gameplay and ownership
//! selectors with one `Add` cut whose initializer runs genesis. The genesis
//! module itself stays unbound.

use crate::augmentation::AugmentationModule;
use crate::catalog::CatalogModule;
use crate::client::GameClient;
use crate::config::GameConfig;
use crate::genesis::{GenesisModule, INIT};
use crate::prestige::PrestigeModule;
use crate::production::ProductionModule;
use cryptolygon_core::abi;
use cryptolygon_core::admin::OwnershipModule;
use cryptolygon_core::cut::{CutInit, ModuleCut};
use cryptolygon_core::error::CallResult;
use cryptolygon_core::id::{Address, Env, Timestamp};
use cryptolygon_core::module::Module;
use cryptolygon_core::proxy::Proxy;
use cryptolygon_core::token::CircleToken;
use std::sync::Arc;
use tracing::info;

/// Where each module landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameModules {
    pub ownership: Address,
    pub production: Address,
    pub augmentation: Address,
    pub prestige: Address,
    pub catalog: Address,
    pub genesis: Address,
}

#[derive(Debug)]
pub struct Deployment {
    pub proxy: Proxy,
    pub token: Address,
    pub modules: GameModules,
}

impl Deployment {
    pub fn into_client(self) -> GameClient {
        GameClient::new(self.proxy)
    }
}

fn deploy_bound(proxy: &mut Proxy, module: Arc<dyn Module>, cuts: &mut Vec<ModuleCut>) -> Address {
    let selectors = module.selectors();
    let address = proxy.deploy(module);
    cuts.push(ModuleCut::add(address, selectors));
    address
}

/// Deploy the game for `owner` at time `now`. The token address in `config`
/// is overwritten with the token created here.
pub fn deploy_game(owner: Address, config: GameConfig, now: Timestamp) -> CallResult<Deployment> {
    let proxy_address = Address::derive(owner, 0);
    let token_address = Address::derive(owner, 1);
    let token = CircleToken::new(token_address, proxy_address);
    let mut proxy = Proxy::new(proxy_address, owner, Box::new(token));

    let mut cuts = Vec::new();
    let ownership = deploy_bound(&mut proxy, Arc::new(OwnershipModule::new()), &mut cuts);
    let production = deploy_bound(&mut proxy, Arc::new(ProductionModule::new()), &mut cuts);
    let augmentation = deploy_bound(&mut proxy, Arc::new(AugmentationModule::new()), &mut cuts);
    let prestige = deploy_bound(&mut proxy, Arc::new(PrestigeModule::new()), &mut cuts);
    let catalog = deploy_bound(&mut proxy, Arc::new(CatalogModule::new()), &mut cuts);
    let genesis = proxy.deploy(Arc::new(GenesisModule::new()));

    let init = CutInit {
        module: genesis,
        selector: INIT.selector(),
        data: abi::encode(&config.with_token(token_address))?,
    };
    proxy.cut(Env::new(owner, now), cuts, Some(init))?;
    info!(proxy = %proxy_address, token = %token_address, %owner, "game deployed");

    Ok(Deployment {
        proxy,
        token: token_address,
        modules: GameModules {
            ownership,
            production,
            augmentation,
            prestige,
            catalog,
            genesis,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptolygon_core::error::CallError;
    use cryptolygon_core::test_utils::owner;

    #[test]
    fn every_gameplay_selector_is_bound() {
        let deployment = deploy_game(owner(), GameConfig::default(), 0).unwrap();
        let proxy = &deployment.proxy;
        let modules = deployment.modules;

        assert_eq!(proxy.module_addresses().len(), 5);
        for selector in ProductionModule::new().selectors() {
            assert_eq!(proxy.module_of(selector), Some(modules.production));
        }
        for selector in PrestigeModule::new().selectors() {
            assert_eq!(proxy.module_of(selector), Some(modules.prestige));
        }
        assert_eq!(proxy.module_of(INIT.selector()), None);
        assert!(proxy.storage().routing().check_consistency().is_ok());
    }

    #[test]
    fn token_starts_empty_at_recorded_address() {
        let deployment = deploy_game(owner(), GameConfig::default(), 0).unwrap();
        assert_eq!(deployment.proxy.token().address(), deployment.token);
        assert_eq!(deployment.proxy.token().total_supply(), 0);
    }

    #[test]
    fn genesis_cannot_rerun() {
        let mut deployment = deploy_game(owner(), GameConfig::default(), 0).unwrap();
        let genesis = deployment.modules.genesis;
        let v2 = deployment.proxy.deploy(Arc::new(GenesisModule::new()));
        let init = CutInit {
            module: genesis,
            selector: INIT.selector(),
            data: abi::encode(&GameConfig::default().with_token(deployment.token)).unwrap(),
        };
        let result = deployment.proxy.cut(
            Env::new(owner(), 1),
            vec![ModuleCut::add(v2, vec![INIT.selector()])],
            Some(init),
        );
        assert_eq!(result, Err(CallError::AlreadyInitialized));
        assert_eq!(deployment.proxy.module_of(INIT.selector()), None);
    }

    #[test]
    fn invalid_config_aborts_deployment() {
        let mut config = GameConfig::default();
        config.polygons.clear();
        assert!(matches!(
            deploy_game(owner(), config, 0),
            Err(CallError::InvalidArguments(_))
        ));
    }
}
