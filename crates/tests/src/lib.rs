pub mod fixtures;

#[cfg(test)]
mod auth_tests;
#[cfg(test)]
mod message_tests;
#[cfg(test)]
mod ordering_tests;
