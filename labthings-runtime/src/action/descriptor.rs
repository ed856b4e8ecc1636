use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use labthings_schema::{json_schema_for, to_data_schema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::context::InvocationContext;
use crate::error::ActionError;
use crate::thing::Thing;

/// The default retention window (spec.md section 4.2): how long a
/// terminated invocation record stays reachable by `GET` before the
/// action manager's sweep removes it.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

type HandlerFn<T, In, Out> =
    Arc<dyn Fn(Arc<T>, In, InvocationContext) -> Pin<Box<dyn Future<Output = Result<Out, ActionError>> + Send>> + Send + Sync>;

/// An action affordance, generic over its owning Thing `T`, input type
/// `In`, and output type `Out`. Bound to a specific Thing instance at
/// registration time (a `Weak<T>`), matching [`crate::property::PropertyDescriptor`].
pub struct ActionDescriptor<T, In, Out> {
    name: String,
    title: Option<String>,
    description: Option<String>,
    retention_time: Duration,
    handler: HandlerFn<T, In, Out>,
    thing: Weak<T>,
    _marker: std::marker::PhantomData<fn() -> (In, Out)>,
}

impl<T, In, Out> ActionDescriptor<T, In, Out>
where
    T: Thing,
    In: Serialize + DeserializeOwned + schemars::JsonSchema + Send + 'static,
    Out: Serialize + DeserializeOwned + schemars::JsonSchema + Send + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, thing: Weak<T>, handler: F) -> Self
    where
        F: Fn(Arc<T>, In, InvocationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, ActionError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            title: None,
            description: None,
            retention_time: DEFAULT_RETENTION,
            handler: Arc::new(move |thing, input, ctx| Box::pin(handler(thing, input, ctx))),
            thing,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn retention_time(mut self, duration: Duration) -> Self {
        self.retention_time = duration;
        self
    }
}

/// Object-safe interface the action manager dispatches through; everything
/// crosses the boundary as `serde_json::Value`, same pattern as
/// [`crate::property::AnyPropertyDescriptor`].
pub trait AnyActionDescriptor: Send + Sync {
    fn name(&self) -> &str;
    fn title(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn retention_time(&self) -> Duration;
    fn input_schema(&self) -> Value;
    fn output_schema(&self) -> Value;

    /// Deserializes `input`, runs the handler to completion, and serializes
    /// the result. Errors from deserialization surface as
    /// `ActionError::InvalidInput` so the manager can report a 422 without
    /// ever starting the invocation.
    fn invoke(
        &self,
        input: Value,
        ctx: InvocationContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ActionError>> + Send>>;
}

impl<T, In, Out> AnyActionDescriptor for ActionDescriptor<T, In, Out>
where
    T: Thing,
    In: Serialize + DeserializeOwned + schemars::JsonSchema + Send + 'static,
    Out: Serialize + DeserializeOwned + schemars::JsonSchema + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn retention_time(&self) -> Duration {
        self.retention_time
    }

    fn input_schema(&self) -> Value {
        to_data_schema(json_schema_for::<In>())
    }

    fn output_schema(&self) -> Value {
        to_data_schema(json_schema_for::<Out>())
    }

    fn invoke(
        &self,
        input: Value,
        ctx: InvocationContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ActionError>> + Send>> {
        let thing = match self.thing.upgrade() {
            Some(t) => t,
            None => {
                return Box::pin(async { Err(ActionError::Failed("thing has been dropped".into())) });
            }
        };
        let typed_input: In = match serde_json::from_value(input) {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(ActionError::InvalidInput(serde_json::json!([e.to_string()]))) }),
        };
        let handler = self.handler.clone();
        Box::pin(async move {
            let output = handler(thing, typed_input, ctx).await?;
            serde_json::to_value(output).map_err(|e| ActionError::Failed(e.to_string()))
        })
    }
}
