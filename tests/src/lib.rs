#![cfg(test)]

mod support;

mod sync {
    mod integration;
}

mod persistence {
    mod integration;
}
