pub mod capture;
pub mod clock;
pub mod controller;
pub mod elapsed;

#[cfg(test)]
mod test_support;
