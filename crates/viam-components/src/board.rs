//! [`BoardClient`] – GPIO, PWM, analog and digital-interrupt access on a
//! single-board computer or microcontroller.
//!
//! Pins are addressed by the board's own naming (`"37"`, `"GPIO17"`, ...).
//! Analog readers and digital interrupts are addressed by their configured
//! names.
//!
//! [`BoardClient::stream_ticks`] is the only streaming call: it appends
//! every tick from the named interrupts to a caller-owned `Vec` until the
//! remote side closes the stream or the cancel token fires.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use viam_rpc::{CancelToken, ServiceDescriptor, collect_into};
use viam_types::{Geometry, Struct, ViamError, wire};

use crate::shared;

pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    "viam.component.board.v1.BoardService",
    &[
        "SetGPIO",
        "GetGPIO",
        "PWM",
        "SetPWM",
        "PWMFrequency",
        "SetPWMFrequency",
        "DoCommand",
        "ReadAnalogReader",
        "WriteAnalog",
        "GetDigitalInterruptValue",
        "StreamTicks",
        "SetPowerMode",
        "GetGeometries",
    ],
);

/// One analog reading plus the reader's range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalogValue {
    pub value: i32,
    #[serde(with = "wire::float")]
    pub min_range: f32,
    #[serde(with = "wire::float")]
    pub max_range: f32,
    #[serde(with = "wire::float")]
    pub step_size: f32,
}

/// A digital-interrupt edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tick {
    pub pin_name: String,
    /// Nanoseconds since the board's epoch.
    #[serde(with = "wire::uint64")]
    pub time: u64,
    pub high: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerMode {
    #[default]
    #[serde(rename = "POWER_MODE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "POWER_MODE_NORMAL")]
    Normal,
    #[serde(rename = "POWER_MODE_OFFLINE_DEEP")]
    OfflineDeep,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GpioResponse {
    high: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PwmResponse {
    #[serde(with = "wire::double")]
    duty_cycle_pct: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PwmFrequencyResponse {
    #[serde(with = "wire::uint64")]
    frequency_hz: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InterruptValueResponse {
    #[serde(with = "wire::int64")]
    value: i64,
}

viam_rpc::resource_adapter! {
    /// Client for a single board.
    pub struct BoardClient => SERVICE;
}

impl BoardClient {
    pub async fn set_gpio(&self, pin: &str, high: bool, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "pin": pin,
            "high": high,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("SetGPIO", request).await
    }

    pub async fn get_gpio(&self, pin: &str, extra: Option<Struct>) -> Result<bool, ViamError> {
        let request = json!({ "name": self.name(), "pin": pin, "extra": wire::extra(extra) });
        let resp: GpioResponse = self.inner.call("GetGPIO", request).await?;
        Ok(resp.high)
    }

    /// PWM duty cycle of `pin`, `0.0..=1.0`.
    pub async fn get_pwm(&self, pin: &str, extra: Option<Struct>) -> Result<f64, ViamError> {
        let request = json!({ "name": self.name(), "pin": pin, "extra": wire::extra(extra) });
        let resp: PwmResponse = self.inner.call("PWM", request).await?;
        Ok(resp.duty_cycle_pct)
    }

    pub async fn set_pwm(
        &self,
        pin: &str,
        duty_cycle_pct: f64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "pin": pin,
            "dutyCyclePct": duty_cycle_pct,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("SetPWM", request).await
    }

    pub async fn get_pwm_frequency(&self, pin: &str, extra: Option<Struct>) -> Result<u64, ViamError> {
        let request = json!({ "name": self.name(), "pin": pin, "extra": wire::extra(extra) });
        let resp: PwmFrequencyResponse = self.inner.call("PWMFrequency", request).await?;
        Ok(resp.frequency_hz)
    }

    pub async fn set_pwm_frequency(
        &self,
        pin: &str,
        frequency_hz: u64,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "pin": pin,
            "frequencyHz": frequency_hz.to_string(),
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("SetPWMFrequency", request).await
    }

    /// Read the analog reader `reader` configured on this board.
    pub async fn read_analog_reader(
        &self,
        reader: &str,
        extra: Option<Struct>,
    ) -> Result<AnalogValue, ViamError> {
        let request = json!({
            "boardName": self.name(),
            "analogReaderName": reader,
            "extra": wire::extra(extra),
        });
        self.inner.call("ReadAnalogReader", request).await
    }

    pub async fn write_analog(&self, pin: &str, value: i32, extra: Option<Struct>) -> Result<(), ViamError> {
        let request = json!({
            "name": self.name(),
            "pin": pin,
            "value": value,
            "extra": wire::extra(extra),
        });
        self.inner.call_empty("WriteAnalog", request).await
    }

    /// Tick count of the digital interrupt `interrupt`.
    pub async fn get_digital_interrupt_value(
        &self,
        interrupt: &str,
        extra: Option<Struct>,
    ) -> Result<i64, ViamError> {
        let request = json!({
            "boardName": self.name(),
            "digitalInterruptName": interrupt,
            "extra": wire::extra(extra),
        });
        let resp: InterruptValueResponse = self.inner.call("GetDigitalInterruptValue", request).await?;
        Ok(resp.value)
    }

    /// Append every tick reported on `pin_names` to `sink`, in arrival order.
    ///
    /// Returns the number of ticks appended. Runs until the stream ends or
    /// `cancel` fires; ticks received before either are kept.
    pub async fn stream_ticks(
        &self,
        pin_names: &[&str],
        sink: &mut Vec<Tick>,
        cancel: Option<CancelToken>,
        extra: Option<Struct>,
    ) -> Result<usize, ViamError> {
        let request = json!({
            "name": self.name(),
            "pinNames": pin_names,
            "extra": wire::extra(extra),
        });
        let stream = self.inner.stream("StreamTicks", request).await?;
        collect_into(
            stream,
            sink,
            |chunk: Value| Ok(Some(serde_json::from_value::<Tick>(chunk)?)),
            cancel,
        )
        .await
    }

    /// Switch the board's power mode, optionally reverting after `duration`.
    pub async fn set_power_mode(
        &self,
        mode: PowerMode,
        duration: Option<Duration>,
        extra: Option<Struct>,
    ) -> Result<(), ViamError> {
        let mut request = json!({
            "name": self.name(),
            "powerMode": mode,
            "extra": wire::extra(extra),
        });
        if let Some(duration) = duration {
            request["duration"] = json!(proto_duration(duration));
        }
        self.inner.call_empty("SetPowerMode", request).await
    }

    pub async fn get_geometries(&self, extra: Option<Struct>) -> Result<Vec<Geometry>, ViamError> {
        shared::get_geometries(&self.inner, extra).await
    }
}

/// `google.protobuf.Duration` JSON form: seconds with up to nine decimals
/// and an `s` suffix.
fn proto_duration(duration: Duration) -> String {
    match duration.subsec_nanos() {
        0 => format!("{}s", duration.as_secs()),
        nanos => format!("{}.{:09}s", duration.as_secs(), nanos),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_support::mock;
    use viam_rpc::{CancelHandle, ClientOptions};

    const ROUTE: &str = "/viam.component.board.v1.BoardService";

    #[tokio::test]
    async fn gpio_round_trip() {
        let mock = mock();
        mock.respond(&format!("{ROUTE}/GetGPIO"), json!({ "high": true }));
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());

        board.set_gpio("11", true, None).await.unwrap();
        assert!(board.get_gpio("11", None).await.unwrap());
        assert_eq!(
            mock.calls()[0].request,
            json!({ "name": "pi", "pin": "11", "high": true, "extra": {} })
        );
    }

    #[tokio::test]
    async fn analog_reader_uses_board_name_field() {
        let mock = mock();
        mock.respond(
            &format!("{ROUTE}/ReadAnalogReader"),
            json!({ "value": 512, "minRange": 0.0, "maxRange": 3.3, "stepSize": 0.0032 }),
        );
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());

        let value = board.read_analog_reader("thermistor", None).await.unwrap();
        assert_eq!(value.value, 512);
        assert_eq!(value.max_range, 3.3);
        assert_eq!(
            mock.last_request(),
            Some(json!({ "boardName": "pi", "analogReaderName": "thermistor", "extra": {} }))
        );
    }

    #[tokio::test]
    async fn pwm_frequency_is_uint64_string_on_the_wire() {
        let mock = mock();
        mock.respond(&format!("{ROUTE}/PWMFrequency"), json!({ "frequencyHz": "20000" }));
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());

        board.set_pwm_frequency("12", 20_000, None).await.unwrap();
        assert_eq!(mock.last_request().unwrap()["frequencyHz"], json!("20000"));
        assert_eq!(board.get_pwm_frequency("12", None).await.unwrap(), 20_000);
    }

    #[tokio::test]
    async fn interrupt_value_accepts_string_int64() {
        let mock = mock();
        mock.respond(&format!("{ROUTE}/GetDigitalInterruptValue"), json!({ "value": "9001" }));
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());
        assert_eq!(board.get_digital_interrupt_value("encoder-a", None).await.unwrap(), 9001);
    }

    #[tokio::test]
    async fn stream_ticks_appends_in_order() {
        let mock = mock();
        mock.stream(
            &format!("{ROUTE}/StreamTicks"),
            vec![
                Ok(json!({ "pinName": "a", "time": "100", "high": true })),
                Ok(json!({ "pinName": "b", "time": "150" })),
                Ok(json!({ "pinName": "a", "time": "200", "high": false })),
            ],
        );
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());

        let mut ticks = Vec::new();
        let appended = board.stream_ticks(&["a", "b"], &mut ticks, None, None).await.unwrap();

        assert_eq!(appended, 3);
        assert_eq!(
            ticks.iter().map(|t| (t.pin_name.as_str(), t.time)).collect::<Vec<_>>(),
            vec![("a", 100), ("b", 150), ("a", 200)]
        );
        assert!(ticks[0].high && !ticks[1].high);
        assert_eq!(mock.calls()[0].request["pinNames"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn cancelled_tick_stream_keeps_received_ticks() {
        let mock = mock();
        mock.stream_then_hang(
            &format!("{ROUTE}/StreamTicks"),
            vec![Ok(json!({ "pinName": "a", "time": "1", "high": true }))],
        );
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());
        let handle = CancelHandle::new();
        let token = handle.token();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.cancel();
        });
        let mut ticks = Vec::new();
        let appended = board
            .stream_ticks(&["a"], &mut ticks, Some(token), None)
            .await
            .unwrap();
        canceller.await.unwrap();

        assert_eq!(appended, 1);
        assert_eq!(ticks.len(), 1);
    }

    #[tokio::test]
    async fn power_mode_duration_uses_proto_json_form() {
        let mock = mock();
        let board = BoardClient::new(mock.clone(), "pi", ClientOptions::default());

        board
            .set_power_mode(PowerMode::OfflineDeep, Some(Duration::from_millis(1500)), None)
            .await
            .unwrap();
        let request = mock.last_request().unwrap();
        assert_eq!(request["powerMode"], json!("POWER_MODE_OFFLINE_DEEP"));
        assert_eq!(request["duration"], json!("1.500000000s"));

        board.set_power_mode(PowerMode::Normal, None, None).await.unwrap();
        assert!(mock.last_request().unwrap().get("duration").is_none());
    }

    #[test]
    fn whole_second_durations_have_no_fraction() {
        assert_eq!(proto_duration(Duration::from_secs(60)), "60s");
    }
}
