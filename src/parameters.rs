//! Sources of resolver parameters.
//!
//! At query time, each parameter of a resolver is filled by a [`Parameter`]
//! out of the standard resolution inputs: the value being resolved, the
//! field arguments, the context and the [`ResolveInfo`].

use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

/// Arguments of a field, by name.
pub type Arguments = IndexMap<ArcStr, serde_json::Value>;

/// Information about the field being resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolveInfo {
    /// Name of the field.
    pub field_name: ArcStr,
    /// Name of the type declaring the field.
    pub parent_type: ArcStr,
}

impl ResolveInfo {
    /// Creates a new [`ResolveInfo`] of the `field_name` field of
    /// `parent_type`.
    pub fn new(field_name: impl Into<ArcStr>, parent_type: impl Into<ArcStr>) -> Self {
        Self {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
        }
    }
}

/// A source of values for a resolver parameter.
///
/// `S` is the type of the value the field is resolved on, and `Ctx` the type
/// of the query context.
pub trait Parameter<S: ?Sized, Ctx: ?Sized>: Send + Sync {
    /// Type of the values this parameter produces.
    type Value;

    /// Produces the value of this parameter.
    ///
    /// The `source` is [`None`] for root fields.
    fn resolve(
        &self,
        source: Option<&S>,
        args: &Arguments,
        context: &Ctx,
        info: &ResolveInfo,
    ) -> Self::Value;
}

/// Tells who is issuing the current query.
pub trait AuthenticationService: Send + Sync {
    /// Type of the users.
    type User;

    /// Indicates whether the current user is logged in.
    fn is_logged(&self) -> bool;

    /// Returns the current user, or [`None`] if nobody is logged in.
    fn get_user(&self) -> Option<Self::User>;
}

/// A parameter filled with the current user.
///
/// Ignores its inputs: the user comes from the [`AuthenticationService`]
/// alone.
#[derive(Debug)]
pub struct InjectUserParameter<A> {
    authentication_service: Arc<A>,
}

impl<A> InjectUserParameter<A> {
    /// Creates a parameter asking the current user to the given
    /// `authentication_service`.
    pub fn new(authentication_service: Arc<A>) -> Self {
        Self {
            authentication_service,
        }
    }
}

impl<A> Clone for InjectUserParameter<A> {
    fn clone(&self) -> Self {
        Self {
            authentication_service: self.authentication_service.clone(),
        }
    }
}

impl<S, Ctx, A> Parameter<S, Ctx> for InjectUserParameter<A>
where
    S: ?Sized,
    Ctx: ?Sized,
    A: AuthenticationService,
{
    type Value = Option<A::User>;

    fn resolve(&self, _: Option<&S>, _: &Arguments, _: &Ctx, info: &ResolveInfo) -> Self::Value {
        let user = self.authentication_service.get_user();
        if user.is_none() {
            tracing::trace!(field = %info.field_name, "no user logged in, injecting none");
        }
        user
    }
}
