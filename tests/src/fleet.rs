mod plan;
mod properties;
mod scenarios;
