use crate::nn::module::Module;
use crate::var::Var;

/// Ordered container that folds `forward` through its children.
#[derive(Default)]
pub struct Sequential {
    modules: Vec<Box<dyn Module>>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential {
            modules: Vec::new(),
        }
    }

    /// Appends a layer to the end of the chain.
    pub fn add<M: Module + 'static>(&mut self, module: M) {
        self.modules.push(Box::new(module));
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Module for Sequential {
    fn forward(&self, input: &Var) -> Var {
        let mut current = input.clone();
        for module in &self.modules {
            current = module.forward(&current);
        }
        current
    }

    fn parameters(&self) -> Vec<Var> {
        let mut params = Vec::new();
        for module in &self.modules {
            params.extend(module.parameters());
        }
        params
    }
}
