/// Answers whether the remote side of a connection is currently a seed.
///
/// Queried by the registry when pairing sessions, so it must be cheap and
/// must not call back into the registry.
pub trait SeedStatus: Send + Sync {
    fn is_seed(&self) -> bool;
}

impl<F> SeedStatus for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_seed(&self) -> bool {
        self()
    }
}
