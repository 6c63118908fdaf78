/// Process configuration loaded once at startup and handed to whoever
/// needs it. Implementations panic on missing variables.
pub trait EnvVars {
    fn load() -> Self;
}
