pub mod expm;
pub mod gtr;
pub mod marginal;
pub mod mg94;
pub mod subst;
