mod common;
mod discount;
mod routing;
mod wizard;
