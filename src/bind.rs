//! JS↔host bindings.
//!
//! A [`Binding`] pairs host-side data with a set of named methods and a JS
//! object of the same name inside the page. The generated stub methods post
//! `{scope, method, params}` payloads through `window.external.invoke`; the
//! host decodes them, runs the registered method, and syncs the data back
//! into the page so a `render` callback can redraw.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

#[derive(Debug, Deserialize)]
struct RpcCall {
    scope: String,
    method: String,
    #[serde(default)]
    params: Vec<Value>,
}

type MethodFn<T> = Box<dyn FnMut(&mut T, &[Value]) -> bool>;

struct Method<T> {
    name: String,
    arity: usize,
    func: MethodFn<T>,
}

pub struct Binding<T> {
    name: String,
    data: T,
    methods: Vec<Method<T>>,
}

impl<T: Serialize> Binding<T> {
    pub fn new(name: impl Into<String>, data: T) -> Self {
        Self {
            name: name.into(),
            data,
            methods: Vec::new(),
        }
    }

    /// Register a method under its JavaScript name. The function receives
    /// the host data and exactly `arity` raw JSON params; it returns `false`
    /// to reject the call (e.g. params of the wrong type), which suppresses
    /// the data re-sync.
    pub fn method<F>(mut self, name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: FnMut(&mut T, &[Value]) -> bool + 'static,
    {
        self.methods.push(Method {
            name: name.into(),
            arity,
            func: Box::new(func),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    /// Script declaring the page-side object and one forwarding stub per
    /// registered method.
    pub fn stub_script(&self) -> String {
        let mut js = format!(
            "if (typeof {0} === 'undefined') {{ {0} = {{}}; }}\n",
            self.name
        );
        for method in &self.methods {
            let args = js_args(method.arity);
            // String as a Write sink never fails
            let _ = write!(
                js,
                "{0}.{1} = function({2}) {{ window.external.invoke(JSON.stringify(\
                 {{scope: \"{0}\", method: \"{1}\", params: [{2}]}})); }};\n",
                self.name, method.name, args
            );
        }
        js
    }

    /// Script pushing the current host data into the page and invoking the
    /// page's `render` callback when one is defined.
    pub fn sync_script(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(&self.data)?;
        Ok(format!(
            "{0}.data={1};if({0}.render){{{0}.render({1});}}",
            self.name, json
        ))
    }

    /// Decode an incoming RPC payload and run the matching method. Returns
    /// `false` when the payload is not valid JSON, addresses another scope,
    /// names an unknown method, carries the wrong number of params, or the
    /// method itself rejects the call.
    pub fn call(&mut self, payload: &str) -> bool {
        let rpc: RpcCall = match serde_json::from_str(payload) {
            Ok(rpc) => rpc,
            Err(_) => return false,
        };
        if rpc.scope != self.name {
            return false;
        }
        let Some(method) = self.methods.iter_mut().find(|m| m.name == rpc.method) else {
            return false;
        };
        if rpc.params.len() != method.arity {
            return false;
        }
        (method.func)(&mut self.data, &rpc.params)
    }
}

fn js_args(arity: usize) -> String {
    let mut js = String::new();
    for i in 0..arity {
        if i > 0 {
            js.push(',');
        }
        let _ = write!(js, "a{}", i);
    }
    js
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Default)]
    struct Calc {
        result: f64,
        history: Vec<String>,
    }

    fn calc_binding() -> Binding<Calc> {
        Binding::new("calc", Calc::default())
            .method("add", 2, |calc: &mut Calc, params| {
                let (Some(a), Some(b)) = (params[0].as_f64(), params[1].as_f64()) else {
                    return false;
                };
                calc.result = a + b;
                calc.history.push(format!("{} + {}", a, b));
                true
            })
            .method("clear", 0, |calc: &mut Calc, _| {
                calc.result = 0.0;
                calc.history.clear();
                true
            })
    }

    #[test]
    fn call_dispatches_to_the_named_method() {
        let mut b = calc_binding();
        assert!(b.call(r#"{"scope":"calc","method":"add","params":[3,4.5]}"#));
        assert_eq!(b.data().result, 7.5);
        assert!(b.call(r#"{"scope":"calc","method":"clear","params":[]}"#));
        assert_eq!(b.data().result, 0.0);
        assert!(b.data().history.is_empty());
    }

    #[test]
    fn call_handles_missing_params_field() {
        let mut b = calc_binding();
        assert!(b.call(r#"{"scope":"calc","method":"clear"}"#));
    }

    #[test]
    fn call_rejects_bad_payloads() {
        let mut b = calc_binding();
        // Not JSON
        assert!(!b.call("not json"));
        // Wrong scope
        assert!(!b.call(r#"{"scope":"other","method":"add","params":[1,2]}"#));
        // Unknown method
        assert!(!b.call(r#"{"scope":"calc","method":"mul","params":[1,2]}"#));
        // Wrong arity
        assert!(!b.call(r#"{"scope":"calc","method":"add","params":[1]}"#));
        // Wrong param types, rejected by the method itself
        assert!(!b.call(r#"{"scope":"calc","method":"add","params":["3",4.5]}"#));
        assert_eq!(b.data().result, 0.0);
    }

    #[test]
    fn stub_script_declares_object_and_methods() {
        let b = calc_binding();
        let js = b.stub_script();
        assert!(js.starts_with("if (typeof calc === 'undefined') { calc = {}; }"));
        assert!(js.contains(
            "calc.add = function(a0,a1) { window.external.invoke(JSON.stringify(\
             {scope: \"calc\", method: \"add\", params: [a0,a1]})); };"
        ));
        assert!(js.contains("calc.clear = function() {"));
    }

    #[test]
    fn sync_script_embeds_serialized_data() {
        let mut b = calc_binding();
        assert!(b.call(r#"{"scope":"calc","method":"add","params":[1,2]}"#));
        let js = b.sync_script().unwrap();
        assert!(js.starts_with("calc.data={\"result\":3.0,"));
        assert!(js.contains("if(calc.render){calc.render("));
    }

    #[test]
    fn js_args_enumerates_positional_names() {
        assert_eq!(js_args(0), "");
        assert_eq!(js_args(1), "a0");
        assert_eq!(js_args(3), "a0,a1,a2");
    }
}
