//! Call-data encoding and per-module operation routing.
//!
//! Requests and responses cross the proxy as bitcode bytes. An
//! [`Operation`] pairs a signature string with its derived [`Selector`],
//! and a [`Router`] maps a module's selectors to typed handler functions.

use crate::error::{CallError, CallResult};
use crate::id::Selector;
use crate::module::CallContext;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// A named operation. The selector is derived from the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub signature: &'static str,
}

impl Operation {
    pub const fn new(signature: &'static str) -> Self {
        Self { signature }
    }

    pub fn selector(&self) -> Selector {
        Selector::from_signature(self.signature)
    }
}

pub fn encode<T: Serialize>(value: &T) -> CallResult<Vec<u8>> {
    bitcode::serialize(value).map_err(|e| CallError::Codec(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> CallResult<T> {
    bitcode::deserialize(data).map_err(|e| CallError::Codec(e.to_string()))
}

type Handler<M> =
    Box<dyn Fn(&M, &mut CallContext<'_>, &[u8]) -> CallResult<Vec<u8>> + Send + Sync>;

struct Route<M> {
    operation: Operation,
    selector: Selector,
    handler: Handler<M>,
}

/// Selector → handler table for one module type.
pub struct Router<M> {
    routes: Vec<Route<M>>,
}

impl<M: 'static> Default for Router<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: 'static> Router<M> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a typed handler. The request is decoded before the handler
    /// runs and the response encoded after it returns.
    pub fn route<Req, Resp>(
        mut self,
        operation: Operation,
        handler: fn(&M, &mut CallContext<'_>, Req) -> CallResult<Resp>,
    ) -> Self
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
    {
        let boxed: Handler<M> = Box::new(
            move |module: &M, ctx: &mut CallContext<'_>, data: &[u8]| {
                let request: Req = decode(data)?;
                let response = handler(module, ctx, request)?;
                encode(&response)
            },
        );
        self.routes.push(Route {
            operation,
            selector: operation.selector(),
            handler: boxed,
        });
        self
    }

    pub fn selectors(&self) -> Vec<Selector> {
        self.routes.iter().map(|route| route.selector).collect()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.routes.iter().map(|route| &route.operation)
    }

    pub fn dispatch(
        &self,
        module: &M,
        ctx: &mut CallContext<'_>,
        selector: Selector,
        data: &[u8],
    ) -> CallResult<Vec<u8>> {
        let route = self
            .routes
            .iter()
            .find(|route| route.selector == selector)
            .ok_or(CallError::UnknownOperation(selector))?;
        (route.handler)(module, ctx, data)
    }
}

impl<M> fmt::Debug for Router<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|route| route.operation.signature))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LevelUp {
        tiers: Vec<u32>,
        amounts: Vec<u32>,
    }

    #[test]
    fn encode_decode_round_trip() {
        let req = LevelUp {
            tiers: vec![0, 1],
            amounts: vec![2, 1],
        };
        let bytes = encode(&req).unwrap();
        assert_eq!(decode::<LevelUp>(&bytes).unwrap(), req);
    }

    #[test]
    fn unit_request_encodes_to_something_decodable() {
        let bytes = encode(&()).unwrap();
        decode::<()>(&bytes).unwrap();
    }

    #[test]
    fn decode_garbage_is_codec_error() {
        let result = decode::<LevelUp>(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(CallError::Codec(_))));
    }

    #[test]
    fn operation_selector_matches_signature_hash() {
        let op = Operation::new("production.start()");
        assert_eq!(op.selector(), Selector::from_signature("production.start()"));
    }
}
