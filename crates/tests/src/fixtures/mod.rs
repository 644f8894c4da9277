pub mod seed;

#[cfg(test)]
pub mod ws;
