//! The request handler contract.
//!
//! A handler names one remote call and knows how to turn its raw JSON result
//! into a typed value. It does not choose its own request id: the
//! [`crate::network::NodeConnection`] assigns ids when the request is
//! submitted, and delivers exactly one terminal outcome per id.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::rpc::{Api, RpcRequest};

pub trait RequestHandler: Send + Sync {
    /// Typed result of the call.
    type Output: DeserializeOwned + Send + 'static;

    fn api(&self) -> Api;

    fn method(&self) -> &'static str;

    /// Ordered argument list.
    fn params(&self) -> Vec<Value>;

    /// Decode the node's `result`. The default is plain serde.
    fn parse(&self, result: Value) -> Result<Self::Output, serde_json::Error> {
        serde_json::from_value(result)
    }

    fn to_request(&self, id: u64) -> RpcRequest {
        RpcRequest::call(id, self.api(), self.method(), self.params())
    }
}

/// Declare a unit-like handler whose params are built from its fields.
///
/// ```ignore
/// handler!(GetChainId => Database "get_chain_id", ChainId, |_| vec![]);
/// ```
macro_rules! handler {
    ($ty:ty => $api:ident $method:literal, $output:ty, |$this:pat_param| $params:expr) => {
        impl $crate::api::handler::RequestHandler for $ty {
            type Output = $output;

            fn api(&self) -> $crate::api::rpc::Api {
                $crate::api::rpc::Api::$api
            }

            fn method(&self) -> &'static str {
                $method
            }

            fn params(&self) -> Vec<serde_json::Value> {
                let $this = self;
                $params
            }
        }
    };
}

pub(crate) use handler;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo(u32);

    impl RequestHandler for Echo {
        type Output = Vec<u32>;

        fn api(&self) -> Api {
            Api::Database
        }

        fn method(&self) -> &'static str {
            "echo"
        }

        fn params(&self) -> Vec<Value> {
            vec![json!(self.0)]
        }
    }

    #[test]
    fn request_uses_assigned_id() {
        let req = Echo(9).to_request(41);
        assert_eq!(req.id, 41);
        assert_eq!(req.params, json!(["database", "echo", [9]]));
    }

    #[test]
    fn default_parse_is_serde() {
        assert_eq!(Echo(0).parse(json!([1, 2])).unwrap(), vec![1, 2]);
        assert!(Echo(0).parse(json!("nope")).is_err());
    }
}
