//! Schema generator contract and baseline adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use app_schema::{AppSchema, GenerationContext};

use crate::error::GenerationError;

/// Object-safe boxed future used by [`SchemaGenerator`] methods.
pub type GeneratorFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The opaque `prompt, context -> schema` function at the AI boundary.
pub trait SchemaGenerator {
    /// Generates an app schema for a prompt, with optional live-app context.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        context: Option<&'a GenerationContext>,
    ) -> GeneratorFuture<'a, Result<AppSchema, GenerationError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Generator for environments without an AI backend; always unavailable.
pub struct NoopSchemaGenerator;

impl SchemaGenerator for NoopSchemaGenerator {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
        _context: Option<&'a GenerationContext>,
    ) -> GeneratorFuture<'a, Result<AppSchema, GenerationError>> {
        Box::pin(async { Err(GenerationError::Unavailable) })
    }
}

/// One observed call into a [`FixedSchemaGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGeneration {
    /// The prompt value as it reached the generator.
    pub prompt: String,
    /// The context object accompanying the prompt, if any.
    pub context: Option<GenerationContext>,
}

#[derive(Debug, Clone)]
/// Generator that replays a fixed response and records every call.
///
/// The baseline test double: stub the response, dispatch, then assert on the
/// constructed prompt/context rather than on any AI output.
pub struct FixedSchemaGenerator {
    response: Rc<RefCell<Result<AppSchema, GenerationError>>>,
    calls: Rc<RefCell<Vec<RecordedGeneration>>>,
}

impl FixedSchemaGenerator {
    /// Creates a generator that always returns a clone of `schema`.
    pub fn new(schema: AppSchema) -> Self {
        Self {
            response: Rc::new(RefCell::new(Ok(schema))),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Creates a generator that always fails with `error`.
    pub fn failing(error: GenerationError) -> Self {
        Self {
            response: Rc::new(RefCell::new(Err(error))),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Replaces the canned response for subsequent calls.
    pub fn set_response(&self, response: Result<AppSchema, GenerationError>) {
        *self.response.borrow_mut() = response;
    }

    /// Returns every call observed so far, in dispatch order.
    pub fn calls(&self) -> Vec<RecordedGeneration> {
        self.calls.borrow().clone()
    }
}

impl SchemaGenerator for FixedSchemaGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        context: Option<&'a GenerationContext>,
    ) -> GeneratorFuture<'a, Result<AppSchema, GenerationError>> {
        Box::pin(async move {
            self.calls.borrow_mut().push(RecordedGeneration {
                prompt: prompt.to_string(),
                context: context.cloned(),
            });
            self.response.borrow().clone()
        })
    }
}
