//! Sequential composition of requests over one shared receptacle.
//!
//! # Design
//! A [`Recipe`] is a bound description of one request that has not run yet.
//! Most recipes are a plain [`RequestSpec`] record, which the runner can log
//! or inspect without executing. When a stage needs a value an earlier stage
//! wrote (an id to look up, say), [`Recipe::from_fn`] builds the record from
//! the receptacle at the moment the stage runs.
//!
//! [`run`] invokes recipes strictly in order against the same `&mut T` and
//! returns the first error unchanged. Stages after a failure never run, and
//! the receptacle keeps whatever earlier stages merged into it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

/// Method, URL and input of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub params: Option<Params>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            method,
            url: url.into(),
            params,
        }
    }

    pub fn get(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(HttpMethod::Get, url, params)
    }

    pub fn post(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(HttpMethod::Post, url, params)
    }

    pub fn put(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(HttpMethod::Put, url, params)
    }

    pub fn patch(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(HttpMethod::Patch, url, params)
    }

    pub fn delete(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(HttpMethod::Delete, url, params)
    }
}

type Builder<T> = dyn Fn(&T) -> RequestSpec + Send + Sync;

enum Source<T> {
    Fixed(RequestSpec),
    Deferred(Arc<Builder<T>>),
}

/// One not-yet-executed request against a receptacle of type `T`.
///
/// Recipes hold no state beyond their binding and can be reused across runs.
pub struct Recipe<T> {
    source: Source<T>,
}

impl<T> Recipe<T> {
    pub fn new(spec: RequestSpec) -> Self {
        Self {
            source: Source::Fixed(spec),
        }
    }

    pub fn get(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(RequestSpec::get(url, params))
    }

    pub fn post(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(RequestSpec::post(url, params))
    }

    pub fn put(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(RequestSpec::put(url, params))
    }

    pub fn patch(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(RequestSpec::patch(url, params))
    }

    pub fn delete(url: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(RequestSpec::delete(url, params))
    }

    /// Build the request from the receptacle when the stage runs.
    pub fn from_fn<F>(build: F) -> Self
    where
        F: Fn(&T) -> RequestSpec + Send + Sync + 'static,
    {
        Self {
            source: Source::Deferred(Arc::new(build)),
        }
    }

    /// The bound record, or `None` when it depends on the receptacle.
    pub fn spec(&self) -> Option<&RequestSpec> {
        match &self.source {
            Source::Fixed(spec) => Some(spec),
            Source::Deferred(_) => None,
        }
    }

    /// The record this recipe would send given the current receptacle.
    pub fn resolve(&self, out: &T) -> Cow<'_, RequestSpec> {
        match &self.source {
            Source::Fixed(spec) => Cow::Borrowed(spec),
            Source::Deferred(build) => Cow::Owned(build(out)),
        }
    }

    /// Perform exactly one dispatch against `out`.
    pub fn invoke(&self, dispatcher: &Dispatcher, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        let spec = self.resolve(out);
        dispatcher.dispatch(spec.method, &spec.url, spec.params.as_ref(), out)
    }
}

impl<T> Clone for Recipe<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Fixed(spec) => Source::Fixed(spec.clone()),
            Source::Deferred(build) => Source::Deferred(Arc::clone(build)),
        };
        Self { source }
    }
}

impl<T> From<RequestSpec> for Recipe<T> {
    fn from(spec: RequestSpec) -> Self {
        Self::new(spec)
    }
}

impl<T> fmt::Debug for Recipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Fixed(spec) => f.debug_tuple("Recipe").field(spec).finish(),
            Source::Deferred(_) => f.write_str("Recipe(<deferred>)"),
        }
    }
}

/// An ordered list of recipes run as one unit.
pub struct Pipeline<T> {
    recipes: Vec<Recipe<T>>,
}

impl<T> Pipeline<T> {
    pub fn new() -> Self {
        Self {
            recipes: Vec::new(),
        }
    }

    pub fn then(mut self, recipe: Recipe<T>) -> Self {
        self.recipes.push(recipe);
        self
    }

    pub fn push(&mut self, recipe: Recipe<T>) {
        self.recipes.push(recipe);
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn recipes(&self) -> &[Recipe<T>] {
        &self.recipes
    }

    pub fn run(&self, dispatcher: &Dispatcher, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        run(dispatcher, out, &self.recipes)
    }
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            recipes: self.recipes.clone(),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.recipes).finish()
    }
}

impl<T> FromIterator<Recipe<T>> for Pipeline<T> {
    fn from_iter<I: IntoIterator<Item = Recipe<T>>>(iter: I) -> Self {
        Self {
            recipes: iter.into_iter().collect(),
        }
    }
}

/// Run `recipes` in order against `out`, stopping at the first error.
///
/// The error is returned exactly as the failing stage produced it.
pub fn run<T>(dispatcher: &Dispatcher, out: &mut T, recipes: &[Recipe<T>]) -> Result<(), ApiError>
where
    T: Serialize + DeserializeOwned,
{
    for (stage, recipe) in recipes.iter().enumerate() {
        debug!(stage, total = recipes.len(), ?recipe, "running pipeline stage");
        if let Err(err) = recipe.invoke(dispatcher, out) {
            warn!(
                stage,
                skipped = recipes.len() - stage - 1,
                error = %err,
                "pipeline stage failed"
            );
            return Err(err);
        }
    }
    Ok(())
}
