//! Browser bindings for the noise reduction engine
//!
//! Wraps the engine in a wasm-bindgen class working on interleaved
//! Float32Array audio, with serde-based info objects for JavaScript.

use denoise_lib::{
    audio_io::{read_audio_bytes, write_audio_bytes, AudioInfo},
    utils, DenoiseError, NoisePreset, NoiseProfileSource, NoiseReducer, ProcessingParams,
    ProcessingResult,
};
use js_sys::Float32Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(start)]
pub fn start() {
    init_panic_hook();
    denoise_lib::init();
}

fn js_err(err: DenoiseError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// Serde-compatible info structs for passing to JavaScript
#[derive(Serialize)]
struct AudioInfoJs {
    sample_rate: u32,
    channels: usize,
    duration_samples: usize,
    duration_seconds: f64,
}

impl From<&AudioInfo> for AudioInfoJs {
    fn from(info: &AudioInfo) -> Self {
        Self {
            sample_rate: info.sample_rate,
            channels: info.channels,
            duration_samples: info.duration_samples,
            duration_seconds: info.duration_seconds,
        }
    }
}

#[derive(Serialize)]
struct ParamsJs {
    reduction_db: f64,
    sensitivity: f64,
    smoothing_taps: usize,
    low_cutoff_hz: f64,
    high_cutoff_hz: f64,
    high_quality: bool,
    frame_size: usize,
    hop_size: usize,
}

impl From<&ProcessingParams> for ParamsJs {
    fn from(params: &ProcessingParams) -> Self {
        Self {
            reduction_db: params.reduction_db,
            sensitivity: params.sensitivity,
            smoothing_taps: params.smoothing_taps,
            low_cutoff_hz: params.low_cutoff_hz,
            high_cutoff_hz: params.high_cutoff_hz,
            high_quality: params.high_quality,
            frame_size: params.frame_size(),
            hop_size: params.hop_size(),
        }
    }
}

#[derive(Serialize)]
struct ReducerInfoJs {
    audio_info: Option<AudioInfoJs>,
    params: ParamsJs,
    has_audio: bool,
    has_profile: bool,
    has_result: bool,
}

#[derive(Serialize)]
struct ResultJs {
    noise_floor_db: f64,
    signal_level_db: f64,
    snr_db: f64,
    dominant_freq_hz: f64,
    noise_kind: String,
    noise_reduction_db: f64,
    new_snr_db: f64,
    quality_score_percent: f64,
}

impl From<&ProcessingResult> for ResultJs {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            noise_floor_db: result.analysis.noise_floor_db,
            signal_level_db: result.analysis.signal_level_db,
            snr_db: result.analysis.snr_db,
            dominant_freq_hz: result.analysis.dominant_freq_hz,
            noise_kind: result.analysis.kind.label().to_string(),
            noise_reduction_db: result.metrics.noise_reduction_db,
            new_snr_db: result.metrics.new_snr_db,
            quality_score_percent: result.metrics.quality_score_percent,
        }
    }
}

#[wasm_bindgen]
pub struct WasmNoiseReducer {
    reducer: NoiseReducer,
    result: Option<ProcessingResult>,
}

#[wasm_bindgen]
impl WasmNoiseReducer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        init_panic_hook();

        Self {
            // Defaults always validate
            reducer: NoiseReducer::new(ProcessingParams::default()).unwrap(),
            result: None,
        }
    }

    /// Load audio data from a Float32Array (interleaved)
    #[wasm_bindgen]
    pub fn load_audio_data(
        &mut self,
        channels: u16,
        sample_rate: u32,
        audio_data: &Float32Array,
    ) -> Result<(), JsValue> {
        if channels == 0 {
            return Err(JsValue::from_str("channel count must be non-zero"));
        }

        let length = audio_data.length() as usize;
        let channel_length = length / channels as usize;

        let mut buffer = vec![0.0; length];
        audio_data.copy_to(&mut buffer[..]);

        // Deinterleave into planar channels
        let mut samples = vec![vec![0.0; channel_length]; channels as usize];
        for i in 0..channel_length {
            for ch in 0..channels as usize {
                samples[ch][i] = buffer[i * channels as usize + ch] as f64;
            }
        }

        let audio_info = AudioInfo::new(sample_rate, channels as usize, channel_length);
        self.result = None;
        self.reducer.load_audio(audio_info, samples).map_err(js_err)
    }

    /// Read audio from byte data (e.g., an uploaded file)
    #[wasm_bindgen]
    pub fn read_audio_bytes(&mut self, data: js_sys::Uint8Array) -> Result<(), JsValue> {
        let (audio_info, channel_data) = read_audio_bytes(data.to_vec()).map_err(js_err)?;
        self.result = None;
        self.reducer
            .load_audio(audio_info, channel_data)
            .map_err(js_err)
    }

    /// Get reducer state information
    #[wasm_bindgen]
    pub fn get_info(&self) -> JsValue {
        let info = ReducerInfoJs {
            audio_info: self.reducer.audio_info().map(AudioInfoJs::from),
            params: ParamsJs::from(self.reducer.params()),
            has_audio: self.reducer.has_audio(),
            has_profile: self.reducer.has_profile(),
            has_result: self.result.is_some(),
        };

        serde_wasm_bindgen::to_value(&info).unwrap_or(JsValue::null())
    }

    /// Set processing parameters
    #[wasm_bindgen]
    pub fn set_params(
        &mut self,
        reduction_db: f64,
        sensitivity: f64,
        smoothing_taps: usize,
        low_cutoff_hz: f64,
        high_cutoff_hz: f64,
        high_quality: bool,
    ) -> Result<(), JsValue> {
        let params = ProcessingParams {
            reduction_db,
            sensitivity,
            smoothing_taps,
            low_cutoff_hz,
            high_cutoff_hz,
            high_quality,
            ..self.reducer.params().clone()
        };

        self.result = None;
        self.reducer.set_params(params).map_err(js_err)
    }

    /// Estimate a noise profile from the quietest part of the input
    #[wasm_bindgen]
    pub fn estimate_profile_auto(&mut self) -> Result<(), JsValue> {
        self.result = None;
        self.reducer
            .estimate_profile(NoiseProfileSource::Automatic)
            .map(|_| ())
            .map_err(js_err)
    }

    /// Estimate a noise profile from a noise-only time range in seconds
    #[wasm_bindgen]
    pub fn estimate_profile_manual(&mut self, start_sec: f64, end_sec: f64) -> Result<(), JsValue> {
        self.result = None;
        self.reducer
            .estimate_profile(NoiseProfileSource::Manual { start_sec, end_sec })
            .map(|_| ())
            .map_err(js_err)
    }

    /// Use a procedural noise profile preset
    #[wasm_bindgen]
    pub fn use_preset(&mut self, name: &str) -> Result<(), JsValue> {
        let preset = NoisePreset::parse(name).map_err(js_err)?;
        self.result = None;
        self.reducer
            .estimate_profile(NoiseProfileSource::Preset(preset))
            .map(|_| ())
            .map_err(js_err)
    }

    /// Available preset names
    #[wasm_bindgen]
    pub fn get_presets(&self) -> JsValue {
        let names: Vec<&str> = NoisePreset::all().iter().map(|p| p.name()).collect();
        serde_wasm_bindgen::to_value(&names).unwrap_or(JsValue::null())
    }

    /// Current noise profile magnitudes for visualization
    #[wasm_bindgen]
    pub fn get_profile(&self) -> Result<Float32Array, JsValue> {
        let profile = self
            .reducer
            .profile()
            .ok_or_else(|| JsValue::from_str("no noise profile estimated"))?;

        let result = Float32Array::new_with_length(profile.len() as u32);
        for (i, &mag) in profile.magnitudes().iter().enumerate() {
            result.set_index(i as u32, mag as f32);
        }
        Ok(result)
    }

    /// Run noise reduction over all channels
    #[wasm_bindgen]
    pub fn process(&mut self) -> Result<JsValue, JsValue> {
        let result = self.reducer.process().map_err(js_err)?;
        let summary = ResultJs::from(&result);
        self.result = Some(result);
        serde_wasm_bindgen::to_value(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get processed audio data as Float32Array (interleaved)
    #[wasm_bindgen]
    pub fn get_processed_audio(&self) -> Result<Float32Array, JsValue> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| JsValue::from_str("no processed audio available"))?;

        let channels = result.channels.len();
        if channels == 0 {
            return Ok(Float32Array::new_with_length(0));
        }

        let samples_per_channel = result.channels[0].len();
        let output = Float32Array::new_with_length((channels * samples_per_channel) as u32);

        for i in 0..samples_per_channel {
            for ch in 0..channels {
                let index = (i * channels + ch) as u32;
                output.set_index(index, result.channels[ch][i] as f32);
            }
        }

        Ok(output)
    }

    /// Save processed audio as WAV bytes
    #[wasm_bindgen]
    pub fn save_audio_bytes(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| JsValue::from_str("no processed audio available"))?;
        let audio_info = self
            .reducer
            .audio_info()
            .ok_or_else(|| JsValue::from_str("no audio info available"))?;

        let bytes = write_audio_bytes(audio_info, &result.channels).map_err(js_err)?;
        let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
        array.copy_from(&bytes);
        Ok(array)
    }

    /// Magnitude spectrum of one input frame for visualization
    #[wasm_bindgen]
    pub fn get_spectrum_data(
        &self,
        channel: usize,
        frame: usize,
        max_points: usize,
    ) -> Result<Float32Array, JsValue> {
        let spectra = self
            .reducer
            .input_spectra(channel, frame + 1)
            .map_err(js_err)?;
        let spectrum = spectra
            .get(frame)
            .ok_or_else(|| JsValue::from_str(&format!("frame {} out of range", frame)))?;

        let output_size = max_points.min(spectrum.len());
        let result = Float32Array::new_with_length(output_size as u32);

        if output_size == spectrum.len() {
            for (i, &mag) in spectrum.iter().enumerate() {
                result.set_index(i as u32, mag as f32);
            }
        } else if output_size > 1 {
            // Downsample for display
            for i in 0..output_size {
                let src_idx = (i * (spectrum.len() - 1)) / (output_size - 1);
                result.set_index(i as u32, spectrum[src_idx] as f32);
            }
        } else if output_size == 1 {
            result.set_index(0, spectrum[0] as f32);
        }

        Ok(result)
    }

    /// Frequency in Hz of an FFT bin under the current configuration
    #[wasm_bindgen]
    pub fn get_bin_frequency(&self, bin: usize) -> f64 {
        match self.reducer.audio_info() {
            Some(info) => {
                utils::bin_to_frequency(bin, info.sample_rate, self.reducer.params().frame_size())
            }
            None => 0.0,
        }
    }
}

impl Default for WasmNoiseReducer {
    fn default() -> Self {
        Self::new()
    }
}
