use crate::osc::registry::ListenerId;

/// Subscribe to every value pushed for an endpoint.
pub trait Bind<Args> {
    type Error;
    fn bind<F>(&self, callback: F) -> Result<ListenerId, Self::Error>
    where
        F: Fn(Args) + Send + Sync + 'static;
}

pub trait Set<Args> {
    type Error;
    fn set(&self, args: Args) -> Result<(), Self::Error>;
}

/// Ask an endpoint for its current value and wait for the answer.
pub trait Query {
    type Output;
    type Error;
    fn query(&self) -> Result<Self::Output, Self::Error>;
}
