extern crate std;

mod growth;
