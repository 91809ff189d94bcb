use anyhow::{bail, Result};
use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct LstmClassifierConfig {
    pub input_size:  usize,
    /// Fixed sequence length the data is padded to; informational only
    pub seq_size:    usize,
    pub hidden_size: usize,
    #[config(default = 2)]
    pub n_classes:   usize,
    #[config(default = 1)]
    pub n_lstm_layers: usize,
    #[config(default = 0)]
    pub n_linear_layers_hidden: usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl LstmClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.hidden_size == 0 {
            bail!("input_size and hidden_size must be positive");
        }
        if self.n_lstm_layers == 0 {
            bail!("at least one LSTM layer is required");
        }
        if self.n_classes < 2 {
            bail!("n_classes must be at least 2, got {}", self.n_classes);
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmClassifier<B> {
        let lstm_layers: Vec<Lstm<B>> = (0..self.n_lstm_layers)
            .map(|ix| {
                let d_input = if ix == 0 { self.input_size } else { self.hidden_size };
                LstmConfig::new(d_input, self.hidden_size, true).init(device)
            })
            .collect();
        let hidden_layers: Vec<Linear<B>> = (0..self.n_linear_layers_hidden)
            .map(|_| LinearConfig::new(self.hidden_size, self.hidden_size).init(device))
            .collect();
        let output  = LinearConfig::new(self.hidden_size, self.n_classes).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        LstmClassifier { lstm_layers, dropout, hidden_layers, output }
    }
}

/// Stacked LSTM over the cascade, mean-pooled over time, then an MLP head.
#[derive(Module, Debug)]
pub struct LstmClassifier<B: Backend> {
    pub lstm_layers:   Vec<Lstm<B>>,
    /// Applied between LSTM layers, never after the last one
    pub dropout:       Dropout,
    pub hidden_layers: Vec<Linear<B>>,
    pub output:        Linear<B>,
}

impl<B: Backend> LstmClassifier<B> {
    /// seq: [batch, seq_len, input_size] → logits: [batch, n_classes]
    pub fn forward(&self, seq: Tensor<B, 3>) -> Tensor<B, 2> {
        let last = self.lstm_layers.len().saturating_sub(1);
        let mut x = seq;
        for (ix, lstm) in self.lstm_layers.iter().enumerate() {
            let (out, _state) = lstm.forward(x, None);
            x = if ix < last { self.dropout.forward(out) } else { out };
        }

        // mean over the time axis: [B, T, H] → [B, 1, H] → [B, H]
        let mut h = x.mean_dim(1).squeeze::<2>(1);
        for layer in &self.hidden_layers {
            h = relu(layer.forward(h));
        }
        self.output.forward(h)
    }

    /// Mean cross-entropy of the logits against class indices.
    pub fn forward_loss(
        &self,
        seq:    Tensor<B, 3>,
        labels: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(seq);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        (loss, logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn config() -> LstmClassifierConfig {
        LstmClassifierConfig::new(11, 40, 12)
            .with_n_lstm_layers(2)
            .with_n_linear_layers_hidden(1)
            .with_dropout(0.5)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: LstmClassifier<NdArray> = config().init(&device);
        let seq = Tensor::<NdArray, 3>::zeros([4, 40, 11], &device);
        assert_eq!(model.forward(seq).dims(), [4, 2]);
    }

    #[test]
    fn test_layer_counts() {
        let model: LstmClassifier<NdArray> = config().init(&Default::default());
        assert_eq!(model.lstm_layers.len(), 2);
        assert_eq!(model.hidden_layers.len(), 1);
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let device = Default::default();
        let model: LstmClassifier<NdArray> = config().init(&device);
        let seq    = Tensor::<NdArray, 3>::ones([3, 5, 11], &device);
        let labels = Tensor::<NdArray, 1, Int>::from_ints([0, 1, 1], &device);
        let (loss, logits) = model.forward_loss(seq, labels);
        assert_eq!(logits.dims(), [3, 2]);
        let loss: f64 = loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        assert!(config().validate().is_ok());
        assert!(config().with_n_lstm_layers(0).validate().is_err());
        assert!(config().with_dropout(1.0).validate().is_err());
        assert!(LstmClassifierConfig::new(11, 40, 0).validate().is_err());
    }
}
